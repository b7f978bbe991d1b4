// crates/server/src/routes/monitor.rs
//! Watch session control: start, stop, status.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::config::not_found;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::watch::SessionStatus;

/// Optional body of `POST /start`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    pub owner_identity: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MonitorResponse {
    pub message: String,
    #[serde(flatten)]
    pub status: SessionStatus,
}

/// POST /start - Begin watching the stored target for `ownerIdentity`, or the
/// most recently saved target when no body is sent.
pub async fn start_monitoring(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<MonitorResponse>> {
    let request: StartRequest = if body.iter().all(u8::is_ascii_whitespace) {
        StartRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))?
    };

    let owner = request
        .owner_identity
        .as_deref()
        .map(str::trim)
        .filter(|o| !o.is_empty());
    let target = state
        .db
        .find_monitor_target(owner)
        .await?
        .ok_or_else(|| not_found(owner))?;

    let status = state.sessions.start(target).await?;
    Ok(Json(MonitorResponse {
        message: "Monitoring started".to_string(),
        status,
    }))
}

/// POST /stop - End the active session.
pub async fn stop_monitoring(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<MonitorResponse>> {
    state.sessions.stop().await?;
    Ok(Json(MonitorResponse {
        message: "Monitoring stopped".to_string(),
        status: state.sessions.status().await,
    }))
}

/// GET /status - Whether a session is active, and for what.
pub async fn session_status(State(state): State<Arc<AppState>>) -> Json<SessionStatus> {
    Json(state.sessions.status().await)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/start", post(start_monitoring))
        .route("/stop", post(stop_monitoring))
        .route("/status", get(session_status))
}
