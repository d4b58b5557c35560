//! The main-menu reply keyboard.

use serde_json::{Value, json};

/// Command strings the keyboard buttons post back as message text.
///
/// The dialog engine carries its own copy of these; a gateway test pins
/// the two sets together.
pub mod action {
    pub const START_NEW_CUSTOMER: &str = "start_new_customer";
    pub const START_RECORD_PAYMENT: &str = "start_record_payment";
    pub const START_SUBMIT_CHATLOG: &str = "start_submit_chatlog";
    pub const TRIGGER_SIMULATE_FAILURE: &str = "trigger_simulate_failure";
    pub const TALK_TO_AGENT: &str = "talk_to_agent";
}

/// Keyboard attached to menu-bearing replies. One full-width row per
/// command; tapping a button posts its `ActionBody` back as plain text.
pub fn main_menu_keyboard() -> Value {
    json!({
        "Type": "keyboard",
        "Buttons": [
            {
                "Columns": 6,
                "Rows": 1,
                "ActionType": "reply",
                "ActionBody": action::START_NEW_CUSTOMER,
                "Text": "\u{2795} New customer",
                "TextSize": "regular",
                "BgColor": "#67DD3F"
            },
            {
                "Columns": 6,
                "Rows": 1,
                "ActionType": "reply",
                "ActionBody": action::START_RECORD_PAYMENT,
                "Text": "\u{1F4B2} Record a payment",
                "TextSize": "regular",
                "BgColor": "#3FD0DD"
            },
            {
                "Columns": 6,
                "Rows": 1,
                "ActionType": "reply",
                "ActionBody": action::START_SUBMIT_CHATLOG,
                "Text": "\u{1F4AC} Submit a chat log",
                "TextSize": "regular",
                "BgColor": "#DD9A3F"
            },
            {
                "Columns": 6,
                "Rows": 1,
                "ActionType": "reply",
                "ActionBody": action::TRIGGER_SIMULATE_FAILURE,
                "Text": "\u{1F4A3} Simulate a failure",
                "TextSize": "regular",
                "BgColor": "#FF0000",
                "TextColor": "#FFFFFF"
            },
            {
                "Columns": 6,
                "Rows": 1,
                "ActionType": "reply",
                "ActionBody": action::TALK_TO_AGENT,
                "Text": "\u{1F9D1}\u{200D}\u{1F4BB} Talk to an agent",
                "TextSize": "regular",
                "BgColor": "#663399",
                "TextColor": "#FFFFFF"
            }
        ]
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_has_one_button_per_command() {
        let keyboard = main_menu_keyboard();
        assert_eq!(keyboard["Type"], "keyboard");

        let buttons = keyboard["Buttons"].as_array().unwrap();
        let bodies: Vec<&str> = buttons
            .iter()
            .map(|b| b["ActionBody"].as_str().unwrap())
            .collect();

        assert_eq!(
            bodies,
            vec![
                action::START_NEW_CUSTOMER,
                action::START_RECORD_PAYMENT,
                action::START_SUBMIT_CHATLOG,
                action::TRIGGER_SIMULATE_FAILURE,
                action::TALK_TO_AGENT,
            ]
        );
    }

    #[test]
    fn every_button_is_a_full_width_reply() {
        let keyboard = main_menu_keyboard();
        for button in keyboard["Buttons"].as_array().unwrap() {
            assert_eq!(button["ActionType"], "reply");
            assert_eq!(button["Columns"], 6);
            assert_eq!(button["Rows"], 1);
        }
    }
}
