//! Conversation events and the agent event bus.
//!
//! Everything a live dashboard needs to follow a conversation flows through
//! here: handoff started, user wrote something, agent wrote something back,
//! handoff ended. The bus fans events out to any number of dashboard
//! subscribers without ever blocking the webhook-processing path.

pub mod bus;
pub mod event;

pub use {
    bus::{AgentEventBus, Subscription},
    event::{ConversationEvent, EndReason},
};
