//! # Configuration Module
//!
//! Runtime configuration read from the environment (optionally seeded from a
//! `.env` file) plus the static workshop → spreadsheet registry.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::action::{Action, MAX_CALLBACK_DATA_LEN};

pub const DEFAULT_MACHINE_INFO_FILE: &str = "Machine_info.txt";
pub const DEFAULT_MACHINE_COLUMN: &str = "Машина";
pub const DEFAULT_LOG_FILE: &str = "bot.log";

/// A named workshop and the spreadsheet listing its machines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workshop {
    pub name: String,
    pub path: PathBuf,
}

/// Ordered, fixed set of workshops with unique names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkshopRegistry {
    workshops: Vec<Workshop>,
}

impl WorkshopRegistry {
    /// Build a registry, rejecting empty sets, duplicate names and names too
    /// long to fit in a button payload
    pub fn new(workshops: Vec<Workshop>) -> Result<Self> {
        if workshops.is_empty() {
            bail!("At least one workshop must be configured");
        }
        for (i, workshop) in workshops.iter().enumerate() {
            if workshop.name.trim().is_empty() {
                bail!("Workshop #{} has an empty name", i + 1);
            }
            if workshops[..i].iter().any(|w| w.name == workshop.name) {
                bail!("Workshop '{}' is configured more than once", workshop.name);
            }
            if Action::SelectWorkshop(workshop.name.clone())
                .callback_data()
                .is_none()
            {
                bail!(
                    "Workshop name '{}' exceeds the {} byte button payload limit",
                    workshop.name,
                    MAX_CALLBACK_DATA_LEN
                );
            }
        }
        Ok(Self { workshops })
    }

    /// The four workshops the bot ships with
    pub fn defaults() -> Self {
        let workshops = (1..=4)
            .map(|n| Workshop {
                name: format!("Цех {n}"),
                path: PathBuf::from(format!("workshop {n}.xlsx")),
            })
            .collect();
        Self { workshops }
    }

    /// Load a JSON array of `{ "name": ..., "path": ... }` entries.
    /// Relative paths are resolved against the file's directory.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read workshops file {}", path.display()))?;
        let mut workshops: Vec<Workshop> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse workshops file {}", path.display()))?;

        if let Some(base) = path.parent() {
            for workshop in &mut workshops {
                if workshop.path.is_relative() {
                    workshop.path = base.join(&workshop.path);
                }
            }
        }

        Self::new(workshops)
    }

    pub fn get(&self, name: &str) -> Option<&Workshop> {
        self.workshops.iter().find(|w| w.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.workshops.iter().map(|w| w.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Workshop> {
        self.workshops.iter()
    }

    pub fn len(&self) -> usize {
        self.workshops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workshops.is_empty()
    }
}

/// Output format of the log file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => bail!("Unsupported LOG_FORMAT '{other}', expected 'text' or 'json'"),
        }
    }
}

/// Everything the bot needs to start
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    pub workshops: WorkshopRegistry,
    pub machine_info_path: PathBuf,
    pub machine_column: String,
    pub log_file: PathBuf,
    pub log_format: LogFormat,
}

impl BotConfig {
    /// Load `.env` (if present) and read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup("TELEGRAM_BOT_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .context("TELEGRAM_BOT_TOKEN must be set")?;

        let workshops = match lookup("WORKSHOPS_FILE") {
            Some(path) => WorkshopRegistry::from_json_file(Path::new(&path))?,
            None => WorkshopRegistry::defaults(),
        };

        let log_format = match lookup("LOG_FORMAT") {
            Some(value) => value.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bot_token,
            workshops,
            machine_info_path: lookup("MACHINE_INFO_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MACHINE_INFO_FILE)),
            machine_column: lookup("MACHINE_COLUMN")
                .unwrap_or_else(|| DEFAULT_MACHINE_COLUMN.to_string()),
            log_file: lookup("LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            log_format,
        })
    }
}
