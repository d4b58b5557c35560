//! Shared handler state.

use std::sync::Arc;

use secrecy::Secret;

use {
    confab_config::ConfabConfig,
    confab_dialog::Engine,
    confab_events::AgentEventBus,
    confab_sessions::SessionStore,
    confab_viber::OutboundSender,
};

use crate::{agent::AgentControl, dispatcher::Dispatcher, reqlog::RequestLog, submit::SubmitApi};

/// Everything the HTTP handlers share. axum clones it per request, so all
/// members sit behind `Arc`s or are cheap copies of config values.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub bus: Arc<AgentEventBus>,
    pub dispatcher: Arc<Dispatcher>,
    pub agent: Arc<AgentControl>,
    pub reqlog: Arc<RequestLog>,
    pub viber_token: Secret<String>,
    pub verify_signature: bool,
    pub dashboard_token: Secret<String>,
    pub customer_key: Secret<String>,
    pub billing_key: Secret<String>,
    pub chatlog_key: Secret<String>,
}

impl AppState {
    /// Wire the full pipeline from config plus the two I/O seams: the
    /// outbound message sender and the downstream submit client.
    #[must_use]
    pub fn new(
        config: &ConfabConfig,
        outbound: Arc<dyn OutboundSender>,
        submit: Arc<dyn SubmitApi>,
    ) -> Self {
        let store = Arc::new(SessionStore::new());
        let bus = Arc::new(AgentEventBus::new());
        let engine = Engine::new(config.viber.stop_keyword.clone());
        let dispatcher = Arc::new(Dispatcher::new(
            engine,
            Arc::clone(&store),
            Arc::clone(&bus),
            Arc::clone(&outbound),
            submit,
        ));
        let agent = Arc::new(AgentControl::new(
            Arc::clone(&store),
            Arc::clone(&bus),
            outbound,
        ));
        Self {
            store,
            bus,
            dispatcher,
            agent,
            reqlog: Arc::new(RequestLog::new(config.monitor.log_capacity)),
            viber_token: config.viber.auth_token.clone(),
            verify_signature: config.viber.verify_signature,
            dashboard_token: config.dashboard.token.clone(),
            customer_key: config.downstream.customer_api_key.clone(),
            billing_key: config.downstream.billing_api_key.clone(),
            chatlog_key: config.downstream.chatlog_api_key.clone(),
        }
    }
}
