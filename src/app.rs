//! Application context shared by every update handler.

use anyhow::Result;

use crate::catalog::Catalog;
use crate::config::{BotConfig, WorkshopRegistry};
use crate::localization::Localizer;
use crate::machine_info::MachineInfoSource;

/// Lookups and messages, built once at startup and injected into handlers
#[derive(Debug)]
pub struct AppContext {
    pub catalog: Catalog,
    pub machine_info: MachineInfoSource,
    pub localizer: Localizer,
}

impl AppContext {
    pub fn new(catalog: Catalog, machine_info: MachineInfoSource, localizer: Localizer) -> Self {
        Self {
            catalog,
            machine_info,
            localizer,
        }
    }

    pub fn from_config(config: &BotConfig) -> Result<Self> {
        Ok(Self::new(
            Catalog::new(config.workshops.clone(), config.machine_column.clone()),
            MachineInfoSource::new(config.machine_info_path.clone()),
            Localizer::new()?,
        ))
    }

    pub fn workshops(&self) -> &WorkshopRegistry {
        self.catalog.workshops()
    }
}
