//! The HTTP gateway.
//!
//! Everything with a socket lives here: the Viber webhook and its
//! dispatcher, the agent dashboard API (SSE feed plus chat controls), the
//! request-log monitor, the built-in sandbox intake services, and the
//! submit client that dials them. The dialog engine, session store and
//! event bus it wires together come from their own crates.

pub mod agent;
pub mod auth;
pub mod dispatcher;
pub mod error;
pub mod reqlog;
pub mod sandbox;
pub mod server;
pub mod state;
pub mod submit;

pub use {
    agent::AgentControl,
    dispatcher::Dispatcher,
    error::{Error, Result},
    reqlog::{LogEntry, RequestLog},
    server::{build_router, serve},
    state::AppState,
    submit::{HttpSubmitClient, SubmitApi, SubmitOutcome},
};
