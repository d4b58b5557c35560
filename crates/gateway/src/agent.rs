//! Agent-side operations, called from the dashboard routes.
//!
//! Agents act outside the dialog engine: replying never moves a session,
//! and ending a chat is the one direct state change they are allowed.

use std::sync::Arc;

use tracing::{info, warn};

use {
    confab_dialog::{DialogState, prompts},
    confab_events::{AgentEventBus, ConversationEvent, EndReason},
    confab_sessions::SessionStore,
    confab_viber::OutboundSender,
};

use crate::error::{Error, Result};

/// Detail returned when `end_chat` targets a user with no active handoff.
pub const NO_ACTIVE_CHAT: &str = "user not found or not in an active agent chat";

pub struct AgentControl {
    store: Arc<SessionStore>,
    bus: Arc<AgentEventBus>,
    outbound: Arc<dyn OutboundSender>,
}

impl AgentControl {
    pub fn new(
        store: Arc<SessionStore>,
        bus: Arc<AgentEventBus>,
        outbound: Arc<dyn OutboundSender>,
    ) -> Self {
        Self {
            store,
            bus,
            outbound,
        }
    }

    /// Deliver an agent-authored message to `receiver`, whatever dialog
    /// state they are in, and echo it on the bus so every dashboard sees
    /// the full exchange. Never touches the session.
    pub async fn send_to_user(&self, receiver: &str, text: &str) -> Result<()> {
        self.outbound.send(receiver, text, false).await?;
        self.bus
            .publish(&ConversationEvent::agent_reply(receiver, text));
        info!(receiver, "agent message delivered");
        Ok(())
    }

    /// Close `user`'s agent handoff from the dashboard side.
    ///
    /// Valid only while the user is actually talking to an agent; any other
    /// state answers [`Error::NotFound`] so a stale dashboard button cannot
    /// wipe an unrelated flow. The whole close runs under the user's lane
    /// lock, so a message racing in lands cleanly before or after it.
    pub async fn end_chat(&self, user: &str) -> Result<()> {
        let Some(lane) = self.store.peek(user) else {
            return Err(Error::not_found(NO_ACTIVE_CHAT));
        };
        let mut session = lane.lock().await;
        if session.state != DialogState::TalkingToAgent {
            return Err(Error::not_found(NO_ACTIVE_CHAT));
        }
        session.reset();

        // The reset is the operation; a failed closing notice does not
        // undo it.
        if let Err(e) = self
            .outbound
            .send(user, prompts::AGENT_ENDED_CHAT, true)
            .await
        {
            warn!(user, error = %e, "closing notice failed to send");
        }
        self.bus
            .publish(&ConversationEvent::ended(user, EndReason::Agent));
        info!(user, "agent ended the chat");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(String, String, bool)>>,
    }

    #[async_trait]
    impl OutboundSender for RecordingSender {
        async fn send(&self, receiver: &str, text: &str, menu: bool) -> confab_viber::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((receiver.to_string(), text.to_string(), menu));
            Ok(())
        }
    }

    struct FailingSender;

    #[async_trait]
    impl OutboundSender for FailingSender {
        async fn send(&self, _receiver: &str, _text: &str, _menu: bool) -> confab_viber::Result<()> {
            Err(confab_viber::Error::message("send quota exhausted"))
        }
    }

    fn control_with(
        outbound: Arc<dyn OutboundSender>,
    ) -> (AgentControl, Arc<SessionStore>, Arc<AgentEventBus>) {
        let store = Arc::new(SessionStore::default());
        let bus = Arc::new(AgentEventBus::new());
        let control = AgentControl::new(Arc::clone(&store), Arc::clone(&bus), outbound);
        (control, store, bus)
    }

    #[tokio::test]
    async fn agent_reply_reaches_the_user_and_the_dashboards() {
        let outbound = Arc::new(RecordingSender::default());
        let (control, store, bus) = control_with(Arc::clone(&outbound) as Arc<dyn OutboundSender>);
        let mut sub = bus.subscribe();

        control.send_to_user("u1", "an agent will call you").await.unwrap();

        let sent = outbound.sent.lock().unwrap().clone();
        assert_eq!(sent, vec![("u1".into(), "an agent will call you".into(), false)]);

        let echo = sub.recv().await.unwrap();
        assert_eq!(echo.kind(), "agent_message");
        assert_eq!(echo.user(), "u1");

        // Replying must not conjure a session for the receiver.
        assert!(!store.exists("u1"));
    }

    #[tokio::test]
    async fn agent_send_failure_surfaces_and_publishes_nothing() {
        let (control, _store, bus) = control_with(Arc::new(FailingSender) as Arc<dyn OutboundSender>);
        let mut sub = bus.subscribe();

        let err = control.send_to_user("u1", "hello").await.unwrap_err();

        assert!(err.to_string().contains("send quota exhausted"));
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn end_chat_for_an_unknown_user_is_not_found() {
        let (control, _store, _bus) =
            control_with(Arc::new(RecordingSender::default()) as Arc<dyn OutboundSender>);

        let err = control.end_chat("ghost").await.unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn end_chat_outside_handoff_is_not_found() {
        let outbound = Arc::new(RecordingSender::default());
        let (control, store, _bus) = control_with(Arc::clone(&outbound) as Arc<dyn OutboundSender>);

        // The user exists but is mid-flow, not in handoff.
        {
            let lane = store.lane("u1");
            lane.lock().await.begin(confab_dialog::Flow::Customer);
        }

        let err = control.end_chat("u1").await.unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
        let lane = store.lane("u1");
        assert_ne!(lane.lock().await.state, DialogState::Idle, "the flow must survive");
        assert!(outbound.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn end_chat_resets_notifies_and_publishes() {
        let outbound = Arc::new(RecordingSender::default());
        let (control, store, bus) = control_with(Arc::clone(&outbound) as Arc<dyn OutboundSender>);
        let mut sub = bus.subscribe();

        {
            let lane = store.lane("u1");
            lane.lock().await.enter_agent_chat();
        }

        control.end_chat("u1").await.unwrap();

        let lane = store.lane("u1");
        assert_eq!(lane.lock().await.state, DialogState::Idle);

        let sent = outbound.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, prompts::AGENT_ENDED_CHAT);
        assert!(sent[0].2, "the closing notice carries the menu back");

        match sub.recv().await.unwrap() {
            ConversationEvent::ConversationEnded { user, reason, .. } => {
                assert_eq!(user, "u1");
                assert_eq!(reason, EndReason::Agent);
            },
            other => panic!("expected the close event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn end_chat_survives_a_failed_closing_notice() {
        let (control, store, bus) = control_with(Arc::new(FailingSender) as Arc<dyn OutboundSender>);
        let mut sub = bus.subscribe();

        {
            let lane = store.lane("u1");
            lane.lock().await.enter_agent_chat();
        }

        control.end_chat("u1").await.unwrap();

        let lane = store.lane("u1");
        assert_eq!(lane.lock().await.state, DialogState::Idle);
        assert_eq!(sub.recv().await.unwrap().kind(), "conversation_ended");
    }
}
