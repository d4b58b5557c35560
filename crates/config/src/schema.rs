//! Config schema types.

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Value of `viber.auth_token` before anyone has configured one.
pub const VIBER_TOKEN_PLACEHOLDER: &str = "YOUR_VIBER_AUTH_TOKEN_HERE";

/// Prefix shared by the shipped sandbox credentials.
pub const SANDBOX_KEY_PREFIX: &str = "sandbox_";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfabConfig {
    pub server: ServerConfig,
    pub viber: ViberConfig,
    pub downstream: DownstreamConfig,
    pub dashboard: DashboardConfig,
    pub monitor: MonitorConfig,
}

/// Gateway server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "0.0.0.0" so Viber can reach the
    /// webhook without extra plumbing.
    pub bind: String,
    /// Port to listen on. Defaults to 8000.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8000,
        }
    }
}

/// Viber bot API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViberConfig {
    /// Bot auth token; also the HMAC key for webhook signatures.
    #[serde(serialize_with = "serialize_secret")]
    pub auth_token: Secret<String>,
    /// API base URL. Override for tests or a regional proxy.
    pub api_url: String,
    /// Bot display name attached to outbound messages.
    pub sender_name: Option<String>,
    /// Reserved word that ends an agent chat from the user side.
    pub stop_keyword: String,
    /// Verify `X-Viber-Content-Signature` on webhook posts. Off by default
    /// because UAT tunnels often re-serialize the body in transit.
    pub verify_signature: bool,
}

impl Default for ViberConfig {
    fn default() -> Self {
        Self {
            auth_token: Secret::new(VIBER_TOKEN_PLACEHOLDER.into()),
            api_url: "https://chatapi.viber.com/pa".into(),
            sender_name: None,
            stop_keyword: "stop".into(),
            verify_signature: false,
        }
    }
}

/// Downstream record-intake services.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownstreamConfig {
    /// Base URL of the intake API. `None` targets the built-in sandbox
    /// endpoints served by this process.
    pub base_url: Option<String>,
    /// Per-request timeout for submit calls, in seconds.
    pub timeout_secs: u64,
    #[serde(serialize_with = "serialize_secret")]
    pub customer_api_key: Secret<String>,
    #[serde(serialize_with = "serialize_secret")]
    pub billing_api_key: Secret<String>,
    #[serde(serialize_with = "serialize_secret")]
    pub chatlog_api_key: Secret<String>,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 5,
            customer_api_key: Secret::new("sandbox_customer_123".into()),
            billing_api_key: Secret::new("sandbox_billing_456".into()),
            chatlog_api_key: Secret::new("sandbox_chatlog_789".into()),
        }
    }
}

/// Agent dashboard access.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Bearer token required on `/agent/*` and `/monitor/*` routes.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            token: Secret::new("sandbox_dashboard_012".into()),
        }
    }
}

/// Request-log ring buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// How many recent sandbox requests to retain. 0 disables capture.
    pub log_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { log_capacity: 100 }
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}
