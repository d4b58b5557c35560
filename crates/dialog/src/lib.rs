//! The conversation state machine.
//!
//! Pure transition logic: given a session and one line of user text, the
//! [`Engine`] decides the next state and returns the side effects (replies,
//! downstream submissions, bus signals) as an ordered action list for the
//! caller to execute. Nothing in this crate performs I/O.

pub mod engine;
pub mod error;
pub mod payload;
pub mod prompts;
pub mod state;

pub use {
    engine::{Action, Engine, Signal},
    error::{Error, Result},
    payload::{ChatLogPayload, CustomerPayload, PaymentPayload, Submission},
    state::{DialogState, Flow, Session},
};
