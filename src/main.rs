use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{info, warn};

use workshop_bot::app::AppContext;
use workshop_bot::bot;
use workshop_bot::config::BotConfig;
use workshop_bot::logging;
use workshop_bot::session::SessionStorage;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env and environment variables
    let config = BotConfig::from_env()?;

    logging::init(&config)?;

    info!(
        workshops = config.workshops.len(),
        machine_info = %config.machine_info_path.display(),
        "Starting workshop machine info bot"
    );

    // Report missing data files at startup as well as on lookup
    for workshop in config.workshops.iter() {
        if !workshop.path.exists() {
            warn!(workshop = %workshop.name, path = %workshop.path.display(), "Workshop spreadsheet not found");
        }
    }
    if !config.machine_info_path.exists() {
        warn!(path = %config.machine_info_path.display(), "Machine info file not found");
    }

    let ctx = Arc::new(AppContext::from_config(&config)?);
    let storage = SessionStorage::new();

    let bot = Bot::new(&config.bot_token);

    info!("Bot initialized, starting dispatcher");

    Dispatcher::builder(bot, bot::schema())
        .dependencies(dptree::deps![ctx, storage])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Dispatcher stopped");
    Ok(())
}
