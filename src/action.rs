//! User actions decoded from Telegram messages and callback payloads.
//!
//! Callback payloads carry a short prefix so a workshop named like a machine
//! can never be mistaken for one. Unprefixed payloads are still accepted:
//! a configured workshop name selects that workshop, anything else is looked
//! up as a machine.

use crate::config::WorkshopRegistry;

pub const WORKSHOP_PREFIX: &str = "ws:";
pub const MACHINE_PREFIX: &str = "m:";
pub const BACK_PAYLOAD: &str = "back_to_workshop";

/// Telegram rejects callback data longer than this many bytes
pub const MAX_CALLBACK_DATA_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start,
    Help,
    SelectWorkshop(String),
    SelectMachine(String),
    GoBack,
}

impl Action {
    /// Decode a command message. Returns `None` for anything that is not a
    /// known command, including `/start@OtherBot`.
    pub fn from_command(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        let command = first.strip_prefix('/')?;
        let command = match command.split_once('@') {
            Some((name, target)) => {
                let addressed_to_us =
                    bot_username.is_some_and(|username| username.eq_ignore_ascii_case(target));
                if !addressed_to_us {
                    return None;
                }
                name
            }
            None => command,
        };

        match command {
            "start" => Some(Action::Start),
            "help" => Some(Action::Help),
            _ => None,
        }
    }

    /// Decode an inline keyboard payload
    pub fn from_callback_data(data: &str, workshops: &WorkshopRegistry) -> Self {
        if data == BACK_PAYLOAD {
            Action::GoBack
        } else if let Some(name) = data.strip_prefix(WORKSHOP_PREFIX) {
            Action::SelectWorkshop(name.to_string())
        } else if let Some(machine) = data.strip_prefix(MACHINE_PREFIX) {
            Action::SelectMachine(machine.to_string())
        } else if workshops.contains(data) {
            Action::SelectWorkshop(data.to_string())
        } else {
            Action::SelectMachine(data.to_string())
        }
    }

    /// Payload for an inline button, `None` when it would exceed Telegram's limit
    pub fn callback_data(&self) -> Option<String> {
        let data = match self {
            Action::SelectWorkshop(name) => format!("{WORKSHOP_PREFIX}{name}"),
            Action::SelectMachine(machine) => format!("{MACHINE_PREFIX}{machine}"),
            Action::GoBack => BACK_PAYLOAD.to_string(),
            Action::Start | Action::Help => return None,
        };
        (data.len() <= MAX_CALLBACK_DATA_LEN).then_some(data)
    }
}
