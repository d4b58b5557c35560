//! HTTP surface of the gateway.
//!
//! Four route groups: the Viber webhook, the agent dashboard API (SSE
//! stream plus send/end controls, bearer-gated), the monitor log feed
//! (same gate), and the built-in sandbox intake services under `/uat/*`.
//!
//! The webhook always answers 200. Viber retries non-200 deliveries, and a
//! dispatch failure here is ours to debug, not Viber's to resend; the body
//! still says `ok` or `error` so operators can see which it was.

use std::{convert::Infallible, net::SocketAddr, time::Duration};

use {
    axum::{
        Json, Router,
        body::Bytes,
        extract::State,
        http::{HeaderMap, StatusCode},
        response::{
            IntoResponse, Response,
            sse::{Event as SseEvent, KeepAlive, Sse},
        },
        routing::{get, post},
    },
    futures::{Stream, StreamExt},
    secrecy::ExposeSecret,
    serde::Deserialize,
    serde_json::json,
    tokio_util::sync::CancellationToken,
    tower_http::cors::{Any, CorsLayer},
    tracing::{error, info, warn},
};

use confab_viber::{WebhookEnvelope, verify_signature};

use crate::{
    auth,
    error::{Error, Result},
    reqlog::LogEntry,
    sandbox::sandbox_router,
    state::AppState,
};

const WEBHOOK_PATH: &str = "/viber/webhook";
const AGENT_SEND_PATH: &str = "/agent/send_message";
const AGENT_END_PATH: &str = "/agent/end_chat";

// ── Router assembly ─────────────────────────────────────────────────────────

/// Build the full gateway router (shared between startup and tests).
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let dashboard = Router::new()
        .route("/agent/stream", get(agent_stream_handler))
        .route(AGENT_SEND_PATH, post(agent_send_handler))
        .route(AGENT_END_PATH, post(agent_end_chat_handler))
        .route("/monitor/logs", get(monitor_logs_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_dashboard_token,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .route(WEBHOOK_PATH, post(webhook_handler))
        .merge(sandbox_router())
        .merge(dashboard)
        .layer(cors)
        .with_state(state)
}

/// Serve until `shutdown` fires.
pub async fn serve(addr: SocketAddr, state: AppState, shutdown: CancellationToken) -> Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "gateway listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}

// ── Webhook ─────────────────────────────────────────────────────────────────

async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // Signature check runs over the raw bytes, before any parsing.
    if state.verify_signature {
        let signature = headers
            .get("X-Viber-Content-Signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !verify_signature(&body, signature, state.viber_token.expose_secret()) {
            warn!("webhook signature rejected");
            state
                .reqlog
                .record_error(WEBHOOK_PATH, "auth_failed", json!({}), "invalid signature");
            return Json(json!({ "status": "error", "message": "invalid signature" }))
                .into_response();
        }
    }

    let raw: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "webhook body is not JSON");
            state
                .reqlog
                .record_error(WEBHOOK_PATH, "error", json!({}), e.to_string());
            return Json(json!({ "status": "error", "message": "malformed event" }))
                .into_response();
        },
    };
    let envelope: WebhookEnvelope = match serde_json::from_value(raw.clone()) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(error = %e, "webhook event failed to decode");
            state
                .reqlog
                .record_error(WEBHOOK_PATH, "error", raw, e.to_string());
            return Json(json!({ "status": "error", "message": "malformed event" }))
                .into_response();
        },
    };

    state.reqlog.record(WEBHOOK_PATH, "received", raw);
    match state.dispatcher.handle(&envelope).await {
        Ok(()) => Json(json!({ "status": "ok" })).into_response(),
        Err(e) => {
            error!(error = %e, event = envelope.event.name(), "webhook dispatch failed");
            state
                .reqlog
                .record_error(WEBHOOK_PATH, "error", json!({}), e.to_string());
            Json(json!({ "status": "error", "message": "internal server error" }))
                .into_response()
        },
    }
}

// ── Agent dashboard ─────────────────────────────────────────────────────────

/// Live conversation feed. Each bus event becomes one SSE `data:` frame of
/// serialized JSON; a 15s ping comment keeps idle proxies from closing the
/// stream. No replay: frames start at subscription time.
async fn agent_stream_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = std::result::Result<SseEvent, Infallible>>> {
    let stream = state.bus.subscribe().map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_else(|_| String::from("{}"));
        Ok::<_, Infallible>(SseEvent::default().data(data))
    });
    info!(dashboards = state.bus.subscriber_count(), "dashboard stream attached");
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

#[derive(Debug, Deserialize)]
struct SendMessageBody {
    receiver_viber_id: String,
    message_text: String,
}

async fn agent_send_handler(
    State(state): State<AppState>,
    Json(body): Json<SendMessageBody>,
) -> Response {
    match state
        .agent
        .send_to_user(&body.receiver_viber_id, &body.message_text)
        .await
    {
        Ok(()) => {
            state.reqlog.record(
                AGENT_SEND_PATH,
                "sent",
                json!({
                    "receiver_viber_id": body.receiver_viber_id,
                    "message_text": body.message_text,
                }),
            );
            Json(json!({ "status": "success", "message": "Message sent to user" }))
                .into_response()
        },
        Err(e) => {
            error!(receiver = %body.receiver_viber_id, error = %e, "agent send failed");
            state.reqlog.record_error(
                AGENT_SEND_PATH,
                "error",
                json!({ "receiver_viber_id": body.receiver_viber_id }),
                e.to_string(),
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "message": format!("Failed to send message: {e}"),
                })),
            )
                .into_response()
        },
    }
}

#[derive(Debug, Deserialize)]
struct EndChatBody {
    viber_id: String,
}

async fn agent_end_chat_handler(
    State(state): State<AppState>,
    Json(body): Json<EndChatBody>,
) -> Response {
    match state.agent.end_chat(&body.viber_id).await {
        Ok(()) => {
            state.reqlog.record(
                AGENT_END_PATH,
                "chat_ended",
                json!({ "viber_id": body.viber_id }),
            );
            Json(json!({ "status": "success", "message": "Chat session ended for user" }))
                .into_response()
        },
        Err(Error::NotFound(detail)) => {
            state.reqlog.record_error(
                AGENT_END_PATH,
                "not_found",
                json!({ "viber_id": body.viber_id }),
                detail.clone(),
            );
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "status": "error", "message": detail })),
            )
                .into_response()
        },
        Err(e) => {
            error!(user = %body.viber_id, error = %e, "end chat failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": e.to_string() })),
            )
                .into_response()
        },
    }
}

// ── Monitor & health ────────────────────────────────────────────────────────

async fn monitor_logs_handler(State(state): State<AppState>) -> Json<Vec<LogEntry>> {
    Json(state.reqlog.list())
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.store.len(),
        "dashboards": state.bus.subscriber_count(),
    }))
}
