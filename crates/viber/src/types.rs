//! Webhook callback types.
//!
//! Viber posts one JSON object per callback. Which field names the user
//! varies by event: `sender` on message events, `user` on
//! conversation_started and subscribed, bare `user_id` on delivery
//! receipts. [`WebhookEnvelope::peer_id`] papers over that.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Message,
    ConversationStarted,
    Delivered,
    Seen,
    Failed,
    Subscribed,
    Unsubscribed,
    /// Sent once by Viber when the webhook URL is registered.
    Webhook,
    #[serde(other)]
    Other,
}

impl EventKind {
    /// The wire name of the event, for log labels.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::ConversationStarted => "conversation_started",
            Self::Delivered => "delivered",
            Self::Seen => "seen",
            Self::Failed => "failed",
            Self::Subscribed => "subscribed",
            Self::Unsubscribed => "unsubscribed",
            Self::Webhook => "webhook",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Peer {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageBody {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl MessageBody {
    pub fn is_text(&self) -> bool {
        self.kind == "text"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    pub event: EventKind,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub sender: Option<Peer>,
    #[serde(default)]
    pub user: Option<Peer>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub message: Option<MessageBody>,
}

impl WebhookEnvelope {
    /// The Viber user this callback concerns, whichever field carries it.
    pub fn peer_id(&self) -> Option<&str> {
        self.sender
            .as_ref()
            .map(|p| p.id.as_str())
            .or_else(|| self.user.as_ref().map(|p| p.id.as_str()))
            .or(self.user_id.as_deref())
    }

    pub fn peer_name(&self) -> Option<&str> {
        self.sender
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .or_else(|| self.user.as_ref().and_then(|p| p.name.as_deref()))
    }

    /// Message text, only for `message` callbacks carrying `type: "text"`.
    /// Stickers, pictures and the rest yield `None`.
    pub fn text(&self) -> Option<&str> {
        self.message
            .as_ref()
            .filter(|m| m.is_text())
            .and_then(|m| m.text.as_deref())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn message_callback_exposes_sender_and_text() {
        let envelope: WebhookEnvelope = serde_json::from_value(json!({
            "event": "message",
            "timestamp": 1457764197627i64,
            "message_token": 4912661846655238145i64,
            "sender": { "id": "01234567890A=", "name": "John McClane" },
            "message": { "type": "text", "text": "a message to the service" }
        }))
        .unwrap();

        assert_eq!(envelope.event, EventKind::Message);
        assert_eq!(envelope.peer_id(), Some("01234567890A="));
        assert_eq!(envelope.peer_name(), Some("John McClane"));
        assert_eq!(envelope.text(), Some("a message to the service"));
    }

    #[test]
    fn conversation_started_names_the_user_field() {
        let envelope: WebhookEnvelope = serde_json::from_value(json!({
            "event": "conversation_started",
            "type": "open",
            "user": { "id": "8GBW5nlCwfTTdZlyBgzD2A==", "name": "Moe" }
        }))
        .unwrap();

        assert_eq!(envelope.event, EventKind::ConversationStarted);
        assert_eq!(envelope.peer_id(), Some("8GBW5nlCwfTTdZlyBgzD2A=="));
        assert!(envelope.text().is_none());
    }

    #[test]
    fn delivery_receipts_carry_a_bare_user_id() {
        let envelope: WebhookEnvelope = serde_json::from_value(json!({
            "event": "delivered",
            "user_id": "01234567890A=",
            "message_token": 4912661846655238145i64
        }))
        .unwrap();

        assert_eq!(envelope.event, EventKind::Delivered);
        assert_eq!(envelope.peer_id(), Some("01234567890A="));
    }

    #[test]
    fn non_text_messages_have_no_text() {
        let envelope: WebhookEnvelope = serde_json::from_value(json!({
            "event": "message",
            "sender": { "id": "01234567890A=" },
            "message": { "type": "sticker", "sticker_id": 46105 }
        }))
        .unwrap();

        assert!(envelope.text().is_none());
    }

    #[test]
    fn unknown_events_fall_through_to_other() {
        let envelope: WebhookEnvelope = serde_json::from_value(json!({
            "event": "client_status",
            "user_id": "01234567890A="
        }))
        .unwrap();

        assert_eq!(envelope.event, EventKind::Other);
    }
}
