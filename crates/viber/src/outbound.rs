//! Outbound message delivery.

use std::time::Duration;

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tracing::{debug, warn},
};

use crate::{
    error::{Error, Result},
    keyboard::main_menu_keyboard,
};

/// Production Viber bot API base.
pub const DEFAULT_API_URL: &str = "https://chatapi.viber.com/pa";

/// Sink for bot-to-user messages. The gateway holds this as a trait object
/// so tests can swap in a recording fake.
#[async_trait]
pub trait OutboundSender: Send + Sync {
    /// Deliver `text` to `receiver`; `menu` attaches the main-menu keyboard.
    async fn send(&self, receiver: &str, text: &str, menu: bool) -> Result<()>;
}

/// Real sender backed by the Viber `send_message` endpoint.
pub struct ViberClient {
    auth_token: Secret<String>,
    api_url: String,
    sender_name: Option<String>,
    client: reqwest::Client,
}

/// Viber's answer envelope. `status` 0 means accepted; anything else is a
/// platform-side rejection even on HTTP 200.
#[derive(Debug, Deserialize)]
struct SendAnswer {
    #[serde(default)]
    status: i64,
    #[serde(default)]
    status_message: String,
}

impl ViberClient {
    pub fn new(
        auth_token: Secret<String>,
        api_url: impl Into<String>,
        sender_name: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            auth_token,
            api_url: api_url.into(),
            sender_name,
            client,
        })
    }
}

#[async_trait]
impl OutboundSender for ViberClient {
    async fn send(&self, receiver: &str, text: &str, menu: bool) -> Result<()> {
        let mut body = serde_json::json!({
            "receiver": receiver,
            "min_api_version": 1,
            "type": "text",
            "text": text,
        });
        if let Some(ref name) = self.sender_name {
            body["sender"] = serde_json::json!({ "name": name });
        }
        if menu {
            body["keyboard"] = main_menu_keyboard();
        }

        let response = self
            .client
            .post(format!("{}/send_message", self.api_url))
            .header("X-Viber-Auth-Token", self.auth_token.expose_secret())
            .json(&body)
            .send()
            .await?;

        let http_status = response.status();
        if !http_status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            warn!(status = %http_status, body = %body_text, "viber send_message HTTP error");
            return Err(Error::message(format!(
                "viber send_message HTTP {http_status}: {body_text}"
            )));
        }

        let answer: SendAnswer = response.json().await?;
        if answer.status != 0 {
            warn!(
                status = answer.status,
                message = %answer.status_message,
                receiver,
                "viber rejected send_message"
            );
            return Err(Error::Api {
                status: answer.status,
                status_message: answer.status_message,
            });
        }

        debug!(receiver, text_len = text.len(), menu, "viber message sent");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json, Router,
        extract::State,
        http::HeaderMap,
        routing::post,
    };

    use super::*;

    type Captured = Arc<Mutex<Vec<(Option<String>, serde_json::Value)>>>;

    async fn capture_handler(
        State(captured): State<Captured>,
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> Json<serde_json::Value> {
        let token = headers
            .get("X-Viber-Auth-Token")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        captured.lock().unwrap().push((token, body));
        Json(serde_json::json!({ "status": 0, "status_message": "ok" }))
    }

    async fn spawn_api(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(api_url: &str, sender_name: Option<String>) -> ViberClient {
        ViberClient::new(
            Secret::new("4453b-test-token".to_string()),
            api_url,
            sender_name,
            Duration::from_secs(2),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn send_posts_the_wire_payload_with_auth_header() {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route("/send_message", post(capture_handler))
            .with_state(Arc::clone(&captured));
        let api_url = spawn_api(router).await;

        client(&api_url, Some("UAT Bot".into()))
            .send("01234567890A=", "hello", false)
            .await
            .unwrap();

        let calls = captured.lock().unwrap();
        let (token, body) = &calls[0];
        assert_eq!(token.as_deref(), Some("4453b-test-token"));
        assert_eq!(body["receiver"], "01234567890A=");
        assert_eq!(body["type"], "text");
        assert_eq!(body["text"], "hello");
        assert_eq!(body["sender"]["name"], "UAT Bot");
        assert!(body.get("keyboard").is_none());
    }

    #[tokio::test]
    async fn menu_flag_attaches_the_keyboard() {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route("/send_message", post(capture_handler))
            .with_state(Arc::clone(&captured));
        let api_url = spawn_api(router).await;

        client(&api_url, None)
            .send("01234567890A=", "pick one", true)
            .await
            .unwrap();

        let calls = captured.lock().unwrap();
        let (_, body) = &calls[0];
        assert_eq!(body["keyboard"]["Type"], "keyboard");
        assert_eq!(body["keyboard"]["Buttons"].as_array().unwrap().len(), 5);
        assert!(body.get("sender").is_none());
    }

    #[tokio::test]
    async fn nonzero_status_is_an_api_error() {
        async fn reject() -> Json<serde_json::Value> {
            Json(serde_json::json!({ "status": 2, "status_message": "invalidAuthToken" }))
        }
        let router = Router::new().route("/send_message", post(reject));
        let api_url = spawn_api(router).await;

        let err = client(&api_url, None)
            .send("01234567890A=", "hello", false)
            .await
            .unwrap_err();

        match err {
            Error::Api {
                status,
                status_message,
            } => {
                assert_eq!(status, 2);
                assert_eq!(status_message, "invalidAuthToken");
            },
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
