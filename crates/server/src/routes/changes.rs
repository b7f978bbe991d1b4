// crates/server/src/routes/changes.rs
//! Change log endpoint.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use watchtower_core::ChangeEvent;

use crate::error::ApiResult;
use crate::state::AppState;

/// GET /file-changes - Every recorded change, newest first.
pub async fn list_file_changes(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<ChangeEvent>>> {
    Ok(Json(state.db.list_recent_change_events().await?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/file-changes", get(list_file_changes))
}
