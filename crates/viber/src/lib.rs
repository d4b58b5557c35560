//! Viber bot API plumbing.
//!
//! Inbound: webhook callback types and signature verification. Outbound:
//! the `send_message` REST call with the reply keyboard. Nothing here
//! knows about dialog state; the gateway wires the two sides together.

pub mod error;
pub mod keyboard;
pub mod outbound;
pub mod signature;
pub mod types;

pub use {
    error::{Error, Result},
    keyboard::main_menu_keyboard,
    outbound::{OutboundSender, ViberClient},
    signature::verify_signature,
    types::{EventKind, MessageBody, Peer, WebhookEnvelope},
};
