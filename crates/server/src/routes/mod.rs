//! HTTP route handlers.

pub mod accounts;
pub mod changes;
pub mod config;
pub mod health;
pub mod monitor;
pub mod ws;

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, Json, Router};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Create the combined router.
///
/// Routes:
/// - GET  /health - Health check
/// - POST /config - Save the monitor target for an owner
/// - GET  /config - Fetch a saved monitor target
/// - POST /start - Start watching a saved target
/// - POST /stop - Stop the active watch session
/// - GET  /status - Watch session status
/// - GET  /file-changes - Recorded changes, newest first
/// - GET  /ws - WebSocket feed of changes as they happen
/// - POST /register - Create an account
/// - POST /login - Issue a session token
/// - GET  /me - Profile for the `x-token` session
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::router())
        .merge(config::router())
        .merge(monitor::router())
        .merge(changes::router())
        .merge(ws::router())
        .merge(accounts::router())
        .with_state(state)
}

/// Unwrap a JSON body, turning every rejection (bad syntax, wrong shape,
/// missing content type) into a 400.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_api_routes_creation() {
        let db = watchtower_db::Database::new_in_memory()
            .await
            .expect("in-memory DB");
        let state = AppState::new(db);
        let _router = api_routes(state);
    }
}
