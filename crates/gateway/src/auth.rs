//! Dashboard bearer auth.
//!
//! One shared token, checked by middleware in front of the `/agent/*` and
//! `/monitor/*` routes. The sandbox intake routes do their own per-service
//! key checks and stay outside this gate.

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use secrecy::ExposeSecret;
use serde_json::json;
use tracing::debug;

use crate::state::AppState;

/// The bearer token on an `Authorization` header, if one is present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Middleware gating the dashboard routes behind `dashboard.token`.
pub async fn require_dashboard_token(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let presented = bearer_token(request.headers());
    if presented.is_some_and(|token| token == state.dashboard_token.expose_secret()) {
        return next.run(request).await;
    }

    debug!(path = %request.uri().path(), "dashboard request without a valid token");
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "status": "error",
            "message": "missing or invalid dashboard token",
        })),
    )
        .into_response()
}
