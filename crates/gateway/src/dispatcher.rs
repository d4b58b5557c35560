//! Webhook event dispatcher.
//!
//! Takes decoded platform events, runs the dialog engine over the sender's
//! session and executes the resulting actions. The whole read-advance-execute
//! sequence happens under the sender's lane lock, so two events for one user
//! can never interleave; events for different users run in parallel.
//!
//! Replies are best-effort: a failed outbound send is logged and the rest of
//! the action list still runs, mirroring how the platform itself treats
//! delivery as fire-and-forget.

use std::sync::Arc;

use tracing::{debug, info, warn};

use {
    confab_dialog::{Action, Engine, Signal, Submission},
    confab_events::{AgentEventBus, ConversationEvent},
    confab_sessions::SessionStore,
    confab_viber::{EventKind, OutboundSender, WebhookEnvelope},
};

use crate::{
    error::Result,
    submit::SubmitApi,
};

pub struct Dispatcher {
    engine: Engine,
    store: Arc<SessionStore>,
    bus: Arc<AgentEventBus>,
    outbound: Arc<dyn OutboundSender>,
    submit: Arc<dyn SubmitApi>,
}

impl Dispatcher {
    pub fn new(
        engine: Engine,
        store: Arc<SessionStore>,
        bus: Arc<AgentEventBus>,
        outbound: Arc<dyn OutboundSender>,
        submit: Arc<dyn SubmitApi>,
    ) -> Self {
        Self {
            engine,
            store,
            bus,
            outbound,
            submit,
        }
    }

    /// Route one decoded webhook event.
    ///
    /// Only `conversation_started` and text messages reach the engine;
    /// delivery receipts and subscription changes are acknowledged untouched.
    pub async fn handle(&self, envelope: &WebhookEnvelope) -> Result<()> {
        match envelope.event {
            EventKind::ConversationStarted => {
                let Some(user) = envelope.peer_id() else {
                    debug!(event = envelope.event.name(), "event without a peer id");
                    return Ok(());
                };
                self.greet(user).await;
                Ok(())
            },
            EventKind::Message => {
                let Some(user) = envelope.peer_id() else {
                    debug!(event = envelope.event.name(), "event without a peer id");
                    return Ok(());
                };
                let Some(text) = envelope.text() else {
                    debug!(user, "non-text message ignored");
                    return Ok(());
                };
                self.on_text(user, text).await
            },
            _ => {
                debug!(event = envelope.event.name(), "event acknowledged without dialog");
                Ok(())
            },
        }
    }

    /// Greet a (re)starting conversation. Always resets the session, so a
    /// replayed `conversation_started` cannot leak fields into the next flow.
    async fn greet(&self, user: &str) {
        let lane = self.store.lane(user);
        let mut session = lane.lock().await;
        let actions = self.engine.greet(&mut session);
        info!(user, "conversation started");
        self.run_actions(user, actions).await;
    }

    async fn on_text(&self, user: &str, text: &str) -> Result<()> {
        let lane = self.store.lane(user);
        let mut session = lane.lock().await;
        let actions = self.engine.advance(&mut session, text)?;
        debug!(user, state = ?session.state, actions = actions.len(), "dialog advanced");
        // The guard stays held while the actions run: downstream submits and
        // bus publishes for this event complete before the next event for
        // the same user can touch the session.
        self.run_actions(user, actions).await;
        Ok(())
    }

    async fn run_actions(&self, user: &str, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Reply { text, menu } => self.deliver(user, &text, menu).await,
                Action::Submit(submission) => self.run_submit(user, &submission).await,
                Action::Publish(signal) => self.bus.publish(&stamp(user, signal)),
            }
        }
    }

    /// Call the flow's downstream service and tell the user how it went.
    async fn run_submit(&self, user: &str, submission: &Submission) {
        let outcome = self.submit.submit(submission).await;
        let text = if outcome.is_success() {
            info!(user, flow = submission.flow_name(), "submission accepted");
            confab_dialog::prompts::submit_success(submission).to_string()
        } else {
            warn!(
                user,
                flow = submission.flow_name(),
                detail = outcome.message(),
                "submission failed"
            );
            confab_dialog::prompts::submit_failure(submission, outcome.message())
        };
        self.deliver(user, &text, false).await;
    }

    async fn deliver(&self, user: &str, text: &str, menu: bool) {
        if let Err(e) = self.outbound.send(user, text, menu).await {
            warn!(user, error = %e, "outbound send failed");
        }
    }
}

/// Attach the user identity and timestamp the engine leaves open.
fn stamp(user: &str, signal: Signal) -> ConversationEvent {
    match signal {
        Signal::Opened => ConversationEvent::opened(user),
        Signal::Inbound { text } => ConversationEvent::inbound(user, text),
        Signal::Closed { reason } => ConversationEvent::ended(user, reason),
    }
}
