use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

/// Who closed an agent conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndReason {
    User,
    Agent,
}

/// One entry on the agent event bus.
///
/// Immutable once constructed; every subscriber receives its own copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversationEvent {
    /// A user entered agent handoff and is waiting for a human.
    NewConversation {
        user: String,
        time: DateTime<Utc>,
    },
    /// A user message relayed to the dashboards during handoff.
    InboundMessage {
        user: String,
        text: String,
        time: DateTime<Utc>,
    },
    /// Echo of an agent reply, so every dashboard sees the full exchange.
    AgentMessage {
        user: String,
        text: String,
        time: DateTime<Utc>,
    },
    /// The handoff is over, either side may have ended it.
    ConversationEnded {
        user: String,
        time: DateTime<Utc>,
        reason: EndReason,
    },
}

impl ConversationEvent {
    pub fn opened(user: impl Into<String>) -> Self {
        Self::NewConversation {
            user: user.into(),
            time: Utc::now(),
        }
    }

    pub fn inbound(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self::InboundMessage {
            user: user.into(),
            text: text.into(),
            time: Utc::now(),
        }
    }

    pub fn agent_reply(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self::AgentMessage {
            user: user.into(),
            text: text.into(),
            time: Utc::now(),
        }
    }

    pub fn ended(user: impl Into<String>, reason: EndReason) -> Self {
        Self::ConversationEnded {
            user: user.into(),
            time: Utc::now(),
            reason,
        }
    }

    /// The user this event is about.
    pub fn user(&self) -> &str {
        match self {
            Self::NewConversation { user, .. }
            | Self::InboundMessage { user, .. }
            | Self::AgentMessage { user, .. }
            | Self::ConversationEnded { user, .. } => user,
        }
    }

    /// Stable tag for logging, matching the serialized `kind` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NewConversation { .. } => "new_conversation",
            Self::InboundMessage { .. } => "inbound_message",
            Self::AgentMessage { .. } => "agent_message",
            Self::ConversationEnded { .. } => "conversation_ended",
        }
    }
}
