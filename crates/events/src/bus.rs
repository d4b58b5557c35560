use std::{
    collections::HashMap,
    pin::Pin,
    sync::{
        Mutex,
        atomic::{AtomicU64, Ordering},
    },
    task::{Context, Poll},
};

use {
    futures::Stream,
    tokio::sync::mpsc,
    tracing::{debug, warn},
};

use crate::event::ConversationEvent;

// ── AgentEventBus ───────────────────────────────────────────────────────────

/// Fan-out bus for [`ConversationEvent`]s.
///
/// Each subscriber owns an unbounded queue, so publishing never waits on a
/// slow dashboard. A consumer that stops reading only grows (and on
/// disconnect loses) its own backlog. Subscribers receive events published
/// after they joined; there is no replay.
#[derive(Debug, Default)]
pub struct AgentEventBus {
    subscribers: Mutex<HashMap<u64, mpsc::UnboundedSender<ConversationEvent>>>,
    next_id: AtomicU64,
}

impl AgentEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber and hand it its private event queue.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        match self.subscribers.lock() {
            Ok(mut subs) => {
                subs.insert(id, tx);
                debug!(subscriber_id = id, total = subs.len(), "bus subscriber added");
            },
            Err(_) => warn!("event bus lock poisoned; subscriber will see no events"),
        }
        Subscription { rx }
    }

    /// Deliver `event` to every live subscriber. Never blocks.
    ///
    /// Subscribers whose queue has been closed (dropped [`Subscription`])
    /// are pruned here.
    pub fn publish(&self, event: &ConversationEvent) {
        let Ok(mut subs) = self.subscribers.lock() else {
            warn!(kind = event.kind(), "event bus lock poisoned; dropping event");
            return;
        };
        subs.retain(|id, tx| {
            let delivered = tx.send(event.clone()).is_ok();
            if !delivered {
                debug!(subscriber_id = id, "bus subscriber gone, pruning");
            }
            delivered
        });
        debug!(
            kind = event.kind(),
            user = event.user(),
            subscribers = subs.len(),
            "event published"
        );
    }

    /// Number of live subscribers (closed queues are pruned first).
    pub fn subscriber_count(&self) -> usize {
        match self.subscribers.lock() {
            Ok(mut subs) => {
                subs.retain(|_, tx| !tx.is_closed());
                subs.len()
            },
            Err(_) => 0,
        }
    }
}

// ── Subscription ────────────────────────────────────────────────────────────

/// One dashboard's private view of the bus.
///
/// Dropping it detaches the subscriber; the bus prunes the dead queue on the
/// next publish. Other subscribers and publishers are unaffected.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<ConversationEvent>,
}

impl Subscription {
    /// Wait for the next event. `None` means the bus itself went away.
    pub async fn recv(&mut self) -> Option<ConversationEvent> {
        self.rx.recv().await
    }

    /// Non-blocking poll, used by tests and drain loops.
    pub fn try_recv(&mut self) -> Option<ConversationEvent> {
        self.rx.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = ConversationEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
