//! # Workshop Machine Info Bot
//!
//! A Telegram bot that lists the machines of a workshop from its spreadsheet
//! and shows the reference text of a chosen machine from a flat info file.

pub mod action;
pub mod app;
pub mod bot;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod localization;
pub mod logging;
pub mod machine_info;
pub mod session;
