//! Logging initialization.
//!
//! Every record goes to stderr and is appended to the log file named by
//! `LOG_FILE`. Level filtering follows `RUST_LOG`, falling back to `info`.
//! `LOG_FORMAT=json` switches the file output to one JSON object per line.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt::{self, time::ChronoLocal};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::{BotConfig, LogFormat};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Open `path` for appending, creating it if needed
pub fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

/// Install the global subscriber. Call once, at startup.
pub fn init(config: &BotConfig) -> Result<()> {
    let file = Mutex::new(open_log_file(&config.log_file)?);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let timer = || ChronoLocal::new(TIMESTAMP_FORMAT.to_string());

    let registry = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_timer(timer())
            .with_target(false)
            .with_writer(std::io::stderr),
    );

    match config.log_format {
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_timer(timer())
                    .with_ansi(false)
                    .with_writer(file),
            )
            .try_init()
            .context("Failed to install tracing subscriber")?,
        LogFormat::Json => registry
            .with(fmt::layer().json().with_timer(timer()).with_writer(file))
            .try_init()
            .context("Failed to install tracing subscriber")?,
    }

    Ok(())
}
