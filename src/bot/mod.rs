//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: Handles `/start`, `/help` and stray text messages
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `ui_builder`: Creates keyboards and formats messages
//! - `dialogue_manager`: Routes actions through the menu state machine

pub mod callback_handler;
pub mod dialogue_manager;
pub mod message_handler;
pub mod ui_builder;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

pub use callback_handler::callback_handler;
pub use dialogue_manager::dispatch;
pub use message_handler::message_handler;
pub use ui_builder::{MenuOption, Reply, ReplyFormat};

/// Update routing tree. Expects `Arc<AppContext>` and `Arc<SessionStorage>`
/// among the dispatcher dependencies.
pub fn schema() -> UpdateHandler<anyhow::Error> {
    dptree::entry()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler))
}
