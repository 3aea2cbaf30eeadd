//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::html;
use tracing::warn;

use crate::action::Action;
use crate::localization::Localizer;

/// Telegram's limit on the visible length of a message
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// One selectable button of a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuOption {
    Workshop(String),
    Machine(String),
    Back,
}

impl MenuOption {
    pub fn action(&self) -> Action {
        match self {
            MenuOption::Workshop(name) => Action::SelectWorkshop(name.clone()),
            MenuOption::Machine(machine) => Action::SelectMachine(machine.clone()),
            MenuOption::Back => Action::GoBack,
        }
    }

    pub fn label(&self, localizer: &Localizer, language_code: Option<&str>) -> String {
        match self {
            MenuOption::Workshop(name) => name.clone(),
            MenuOption::Machine(machine) => machine.clone(),
            MenuOption::Back => localizer.t_lang("button-back", language_code),
        }
    }
}

/// How Telegram should parse the reply text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyFormat {
    #[default]
    Plain,
    Html,
}

/// Platform-independent response: text plus the options to choose from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    pub text: String,
    pub format: ReplyFormat,
    pub options: Vec<MenuOption>,
}

impl Reply {
    pub fn plain(text: impl Into<String>, options: Vec<MenuOption>) -> Self {
        Self {
            text: text.into(),
            format: ReplyFormat::Plain,
            options,
        }
    }

    pub fn html(text: impl Into<String>, options: Vec<MenuOption>) -> Self {
        Self {
            text: text.into(),
            format: ReplyFormat::Html,
            options,
        }
    }
}

/// Options for every configured workshop, in configuration order
pub fn workshop_options<'a>(names: impl Iterator<Item = &'a str>) -> Vec<MenuOption> {
    names.map(|name| MenuOption::Workshop(name.to_string())).collect()
}

/// Options for a machine list followed by the back button
pub fn machine_options(machines: Vec<String>) -> Vec<MenuOption> {
    machines
        .into_iter()
        .map(MenuOption::Machine)
        .chain(std::iter::once(MenuOption::Back))
        .collect()
}

/// HTML body of the machine info reply: bold title, then the escaped block
pub fn format_machine_info(title: &str, body: &str) -> String {
    let budget = MAX_MESSAGE_CHARS.saturating_sub(title.chars().count() + 2);
    let body = if body.chars().count() > budget {
        let cut: String = body.chars().take(budget.saturating_sub(1)).collect();
        format!("{cut}…")
    } else {
        body.to_string()
    };

    format!("<b>{}</b>\n{}", html::escape(title), html::escape(&body))
}

/// Create the inline keyboard for a reply, one button per row.
///
/// Buttons whose payload does not fit Telegram's callback data limit are left out.
pub fn create_menu_keyboard(
    options: &[MenuOption],
    localizer: &Localizer,
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let buttons: Vec<Vec<InlineKeyboardButton>> = options
        .iter()
        .filter_map(|option| {
            let label = option.label(localizer, language_code);
            match option.action().callback_data() {
                Some(data) => Some(vec![InlineKeyboardButton::callback(label, data)]),
                None => {
                    warn!(label = %label, "Button payload exceeds callback data limit, skipping");
                    None
                }
            }
        })
        .collect();

    InlineKeyboardMarkup::new(buttons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    fn callback_payloads(keyboard: &InlineKeyboardMarkup) -> Vec<String> {
        keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|button| match &button.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_machine_options_end_with_back() {
        let options = machine_options(vec!["A".to_string(), "A".to_string()]);
        assert_eq!(
            options,
            vec![
                MenuOption::Machine("A".to_string()),
                MenuOption::Machine("A".to_string()),
                MenuOption::Back
            ]
        );
    }

    #[test]
    fn test_keyboard_payloads() {
        let localizer = Localizer::new().unwrap();
        let options = vec![
            MenuOption::Workshop("Цех 1".to_string()),
            MenuOption::Machine("Пресс".to_string()),
            MenuOption::Back,
        ];
        let keyboard = create_menu_keyboard(&options, &localizer, Some("ru"));

        assert_eq!(keyboard.inline_keyboard.len(), 3);
        assert_eq!(keyboard.inline_keyboard[2][0].text, "Назад");
        assert_eq!(
            callback_payloads(&keyboard),
            vec!["ws:Цех 1", "m:Пресс", "back_to_workshop"]
        );
    }

    #[test]
    fn test_oversized_payload_is_skipped() {
        let localizer = Localizer::new().unwrap();
        let options = vec![MenuOption::Machine("Ж".repeat(40)), MenuOption::Back];
        let keyboard = create_menu_keyboard(&options, &localizer, None);
        assert_eq!(callback_payloads(&keyboard), vec!["back_to_workshop"]);
    }

    #[test]
    fn test_machine_info_is_escaped() {
        let text = format_machine_info("Info A:", "Pressure < 5 & > 1\n");
        assert_eq!(text, "<b>Info A:</b>\nPressure &lt; 5 &amp; &gt; 1\n");
    }

    #[test]
    fn test_machine_info_is_truncated() {
        let body = "x".repeat(MAX_MESSAGE_CHARS * 2);
        let text = format_machine_info("T", &body);
        assert!(text.chars().count() < MAX_MESSAGE_CHARS + 16);
        assert!(text.ends_with('…'));
    }
}
