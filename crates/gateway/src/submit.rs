//! Downstream submit client.
//!
//! Completed flows are posted to the flow's backend service with that flow's
//! own credential. Outcomes are reported, not raised: whatever goes wrong is
//! folded into a [`SubmitOutcome::Failure`] whose text ends up in front of
//! the user, and nothing is retried.

use std::time::Duration;

use {
    async_trait::async_trait,
    confab_config::DownstreamConfig,
    confab_dialog::Submission,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tracing::{debug, warn},
};

use crate::error::Result;

/// Downstream service paths, shared by the client and the sandbox router.
pub mod endpoint {
    pub const CUSTOMER_CREATE: &str = "/uat/customers/create";
    pub const PAYMENT_RECORD: &str = "/uat/payments";
    pub const CHATLOG_SUBMIT: &str = "/uat/chat-logs";
    pub const SIMULATE_FAILURE: &str = "/uat/simulate-failure";
}

/// What the downstream service said about one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Success { message: String },
    Failure { message: String },
}

impl SubmitOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Success { message } | Self::Failure { message } => message,
        }
    }
}

/// Seam between the dispatcher and the downstream services. Tests swap in a
/// recording fake; production uses [`HttpSubmitClient`].
#[async_trait]
pub trait SubmitApi: Send + Sync {
    async fn submit(&self, submission: &Submission) -> SubmitOutcome;
}

/// HTTP client for the downstream submit services.
pub struct HttpSubmitClient {
    base_url: String,
    customer_key: Secret<String>,
    billing_key: Secret<String>,
    chatlog_key: Secret<String>,
    client: reqwest::Client,
}

/// Answer envelope shared by all submit services.
#[derive(Debug, Default, Deserialize)]
struct SubmitAnswer {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
}

impl HttpSubmitClient {
    pub fn new(
        base_url: impl Into<String>,
        customer_key: Secret<String>,
        billing_key: Secret<String>,
        chatlog_key: Secret<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into(),
            customer_key,
            billing_key,
            chatlog_key,
            client,
        })
    }

    /// Build from config. `own_base` is this process's own address, used when
    /// `downstream.base_url` is unset so the client targets the built-in
    /// sandbox endpoints.
    pub fn from_config(config: &DownstreamConfig, own_base: &str) -> Result<Self> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| own_base.to_string());
        Self::new(
            base_url,
            config.customer_api_key.clone(),
            config.billing_api_key.clone(),
            config.chatlog_api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// The path and credential a submission travels with. The failure
    /// simulation rides on the customer credential.
    fn route(&self, submission: &Submission) -> (&'static str, &Secret<String>) {
        match submission {
            Submission::Customer(_) => (endpoint::CUSTOMER_CREATE, &self.customer_key),
            Submission::Payment(_) => (endpoint::PAYMENT_RECORD, &self.billing_key),
            Submission::ChatLog(_) => (endpoint::CHATLOG_SUBMIT, &self.chatlog_key),
            Submission::SimulateFailure => (endpoint::SIMULATE_FAILURE, &self.customer_key),
        }
    }
}

#[async_trait]
impl SubmitApi for HttpSubmitClient {
    async fn submit(&self, submission: &Submission) -> SubmitOutcome {
        let (path, key) = self.route(submission);
        let url = format!("{}{path}", self.base_url);

        let response = match self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", key.expose_secret()))
            .json(&body_json(submission))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(flow = submission.flow_name(), error = %e, "downstream request failed");
                return SubmitOutcome::Failure {
                    message: format!("request failed: {e}"),
                };
            },
        };

        let http_status = response.status();
        let body = response.text().await.unwrap_or_default();
        let answer: SubmitAnswer = serde_json::from_str(&body).unwrap_or_default();

        if http_status.is_success() && answer.status == "success" {
            debug!(
                flow = submission.flow_name(),
                message = %answer.message,
                "downstream accepted submission"
            );
            return SubmitOutcome::Success {
                message: answer.message,
            };
        }

        let message = if answer.message.is_empty() {
            format!("HTTP {http_status}: {body}")
        } else {
            answer.message
        };
        warn!(
            flow = submission.flow_name(),
            status = %http_status,
            message = %message,
            "downstream rejected submission"
        );
        SubmitOutcome::Failure { message }
    }
}

/// The wire body: the bare payload record, no envelope. The failure
/// simulation posts an empty object.
fn body_json(submission: &Submission) -> serde_json::Value {
    match submission {
        Submission::Customer(payload) => serde_json::to_value(payload).unwrap_or_default(),
        Submission::Payment(payload) => serde_json::to_value(payload).unwrap_or_default(),
        Submission::ChatLog(payload) => serde_json::to_value(payload).unwrap_or_default(),
        Submission::SimulateFailure => serde_json::json!({}),
    }
}
