//! Every line the bot says, in one place.
//!
//! Texts are deployment content; translating the bot means editing this
//! module only. Menu commands are wire constants and must match the
//! keyboard's action bodies exactly.

use crate::{payload::Submission, state::DialogState, state::Flow};

/// Fixed menu commands, sent by the platform keyboard as plain text.
pub mod command {
    pub const START_NEW_CUSTOMER: &str = "start_new_customer";
    pub const START_RECORD_PAYMENT: &str = "start_record_payment";
    pub const START_SUBMIT_CHATLOG: &str = "start_submit_chatlog";
    pub const TRIGGER_SIMULATE_FAILURE: &str = "trigger_simulate_failure";
    pub const TALK_TO_AGENT: &str = "talk_to_agent";
}

pub const WELCOME: &str = "Welcome! This is the UAT service assistant. How can I help you today?";
pub const MENU_FOLLOW_UP: &str = "Is there anything else I can help you with?";
pub const IDLE_FALLBACK: &str = "Sorry, I didn't catch that. Please pick an option from the menu:";

// ── Collection prompts ──────────────────────────────────────────────────────

pub const ASK_CUSTOMER_NAME: &str =
    "Let's create a new customer. Please enter the customer's name:";
pub const ASK_PAYMENT_USER_ID: &str =
    "Let's record a payment. Please enter the user ID:";
pub const ASK_CHATLOG_VIBER_ID: &str =
    "Let's submit a chat log. Please enter the Viber ID (e.g. +959xxxxxxxx):";

pub fn ask_customer_phone(name: &str) -> String {
    format!("Name recorded as `{name}`. Now enter the customer's phone number (e.g. +959xxxxxxxx):")
}

pub fn ask_customer_region(phone: &str) -> String {
    format!("Phone recorded as `{phone}`. Finally, enter the customer's region (e.g. Yangon, Mandalay):")
}

pub fn ask_payment_amount(user_id: &str) -> String {
    format!("User ID recorded as `{user_id}`. Now enter the amount (e.g. 25000):")
}

pub fn ask_payment_method(amount: &str) -> String {
    format!("Amount recorded as `{amount}`. Now enter the payment method (e.g. KBZ Pay, Wave Money):")
}

pub fn ask_payment_reference(method: &str) -> String {
    format!("Method recorded as `{method}`. Finally, enter the reference ID:")
}

pub fn ask_chatlog_message(viber_id: &str) -> String {
    format!("Viber ID recorded as `{viber_id}`. Now enter the chat message:")
}

// ── Validation re-prompts ───────────────────────────────────────────────────

pub const INVALID_PHONE: &str =
    "That phone number doesn't look right. It must start with `+` followed by digits only (e.g. +959xxxxxxxx). Please try again:";
pub const INVALID_AMOUNT: &str =
    "That amount doesn't look right. Please enter a positive whole number (e.g. 25000):";
pub const INVALID_VIBER_ID: &str =
    "That Viber ID doesn't look right. It must start with `+` followed by digits only (e.g. +959xxxxxxxx). Please try again:";

/// What to say when input for `state` fails its rule.
pub fn invalid_input(state: DialogState) -> &'static str {
    match state {
        DialogState::CollectingCustomerName => {
            "The name cannot be empty. Please enter the customer's name:"
        },
        DialogState::CollectingCustomerPhone => INVALID_PHONE,
        DialogState::CollectingCustomerRegion => {
            "The region cannot be empty. Please enter the customer's region:"
        },
        DialogState::CollectingPaymentUserId => {
            "The user ID cannot be empty. Please enter the user ID:"
        },
        DialogState::CollectingPaymentAmount => INVALID_AMOUNT,
        DialogState::CollectingPaymentMethod => {
            "The payment method cannot be empty. Please enter the payment method:"
        },
        DialogState::CollectingPaymentReferenceId => {
            "The reference ID cannot be empty. Please enter the reference ID:"
        },
        DialogState::CollectingChatlogViberId => INVALID_VIBER_ID,
        DialogState::CollectingChatlogMessage => {
            "The chat message cannot be empty. Please enter the message:"
        },
        DialogState::Idle | DialogState::TalkingToAgent => IDLE_FALLBACK,
    }
}

// ── Submit progress & outcomes ──────────────────────────────────────────────

pub const SIMULATE_STARTING: &str = "Triggering a simulated failure...";

pub fn submitting(flow: Flow) -> &'static str {
    match flow {
        Flow::Customer => "Thank you! Processing the customer details...",
        Flow::Payment => "Thank you! Recording the payment...",
        Flow::Chatlog => "Thank you! Submitting the chat log...",
    }
}

pub fn submit_success(submission: &Submission) -> &'static str {
    match submission {
        Submission::Customer(_) => {
            "✅ Customer created successfully. You can continue with other services."
        },
        Submission::Payment(_) => {
            "✅ Payment recorded successfully. You can continue with other services."
        },
        Submission::ChatLog(_) => {
            "✅ Chat log submitted successfully. You can continue with other services."
        },
        Submission::SimulateFailure => "✅ Simulated failure triggered successfully.",
    }
}

pub fn submit_failure(submission: &Submission, detail: &str) -> String {
    match submission {
        Submission::Customer(_) => format!("❌ Customer creation failed: {detail}"),
        Submission::Payment(_) => format!("❌ Payment recording failed: {detail}"),
        Submission::ChatLog(_) => format!("❌ Chat log submission failed: {detail}"),
        Submission::SimulateFailure => {
            format!("💥 The failure endpoint reported an error: {detail}")
        },
    }
}

// ── Agent handoff ───────────────────────────────────────────────────────────

pub fn agent_handoff(stop_keyword: &str) -> String {
    format!(
        "You are now connected to a customer agent. Please wait for a reply.\nType '{stop_keyword}' at any time to end the conversation."
    )
}

pub const AGENT_RELAY_ACK: &str =
    "Your message has been forwarded to the agent. Please hold on.";
pub const USER_ENDED_CHAT: &str =
    "The agent conversation has been closed.\nIs there anything else I can help you with?";
pub const AGENT_ENDED_CHAT: &str =
    "The agent has closed this conversation. Is there anything else I can help you with?";
