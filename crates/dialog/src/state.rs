use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ── Dialog states ───────────────────────────────────────────────────────────

/// Where a user currently is in the conversation.
///
/// Collection states belong to exactly one [`Flow`]; `Idle` and
/// `TalkingToAgent` stand outside every flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogState {
    #[default]
    Idle,
    CollectingCustomerName,
    CollectingCustomerPhone,
    CollectingCustomerRegion,
    CollectingPaymentUserId,
    CollectingPaymentAmount,
    CollectingPaymentMethod,
    CollectingPaymentReferenceId,
    CollectingChatlogViberId,
    CollectingChatlogMessage,
    TalkingToAgent,
}

impl DialogState {
    /// The flow family this state collects for, if any.
    pub fn flow(self) -> Option<Flow> {
        match self {
            Self::CollectingCustomerName
            | Self::CollectingCustomerPhone
            | Self::CollectingCustomerRegion => Some(Flow::Customer),
            Self::CollectingPaymentUserId
            | Self::CollectingPaymentAmount
            | Self::CollectingPaymentMethod
            | Self::CollectingPaymentReferenceId => Some(Flow::Payment),
            Self::CollectingChatlogViberId | Self::CollectingChatlogMessage => Some(Flow::Chatlog),
            Self::Idle | Self::TalkingToAgent => None,
        }
    }

    /// The payload key this state fills in.
    pub fn field_key(self) -> Option<&'static str> {
        match self {
            Self::CollectingCustomerName => Some("name"),
            Self::CollectingCustomerPhone => Some("phone"),
            Self::CollectingCustomerRegion => Some("region"),
            Self::CollectingPaymentUserId => Some("user_id"),
            Self::CollectingPaymentAmount => Some("amount"),
            Self::CollectingPaymentMethod => Some("method"),
            Self::CollectingPaymentReferenceId => Some("reference_id"),
            Self::CollectingChatlogViberId => Some("viber_id"),
            Self::CollectingChatlogMessage => Some("message"),
            Self::Idle | Self::TalkingToAgent => None,
        }
    }

    /// The state that follows this one within its flow; `None` when this is
    /// the flow's last collection state (or not a collection state at all).
    pub fn next_in_flow(self) -> Option<DialogState> {
        match self {
            Self::CollectingCustomerName => Some(Self::CollectingCustomerPhone),
            Self::CollectingCustomerPhone => Some(Self::CollectingCustomerRegion),
            Self::CollectingPaymentUserId => Some(Self::CollectingPaymentAmount),
            Self::CollectingPaymentAmount => Some(Self::CollectingPaymentMethod),
            Self::CollectingPaymentMethod => Some(Self::CollectingPaymentReferenceId),
            Self::CollectingChatlogViberId => Some(Self::CollectingChatlogMessage),
            _ => None,
        }
    }

    pub fn is_collecting(self) -> bool {
        self.flow().is_some()
    }
}

// ── Flows ───────────────────────────────────────────────────────────────────

/// A named family of collection states sharing one payload schema and one
/// terminal submit action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    Customer,
    Payment,
    Chatlog,
}

impl Flow {
    pub fn first_state(self) -> DialogState {
        match self {
            Self::Customer => DialogState::CollectingCustomerName,
            Self::Payment => DialogState::CollectingPaymentUserId,
            Self::Chatlog => DialogState::CollectingChatlogViberId,
        }
    }

    /// Every payload key this flow may legitimately collect.
    pub fn field_keys(self) -> &'static [&'static str] {
        match self {
            Self::Customer => &["name", "phone", "region"],
            Self::Payment => &["user_id", "amount", "method", "reference_id"],
            Self::Chatlog => &["viber_id", "message"],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Payment => "payment",
            Self::Chatlog => "chatlog",
        }
    }
}

// ── Session ─────────────────────────────────────────────────────────────────

/// Per-user conversation state: the current dialog state plus the partially
/// collected payload.
///
/// `fields` only ever holds keys belonging to the flow of `state`; switching
/// flow or returning to idle clears it in the same step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub state: DialogState,
    pub fields: BTreeMap<String, String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to the main menu: idle with nothing collected.
    pub fn reset(&mut self) {
        self.state = DialogState::Idle;
        self.fields.clear();
    }

    /// Enter `flow` at its first collection state, dropping anything a
    /// previous flow may have collected.
    pub fn begin(&mut self, flow: Flow) {
        self.fields.clear();
        self.state = flow.first_state();
    }

    /// Hand off to a human agent. Collected fields do not survive the switch.
    pub fn enter_agent_chat(&mut self) {
        self.fields.clear();
        self.state = DialogState::TalkingToAgent;
    }
}
