// crates/server/src/routes/config.rs
//! Monitor target registry endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use watchtower_core::{MonitorTarget, ValidationError, DEFAULT_INTERVAL_MS};

use super::json_body;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Body of `POST /config`. The legacy field names `email` and
/// `files_to_track` are accepted too.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRequest {
    #[serde(alias = "email")]
    pub owner_identity: Option<String>,
    pub name: Option<String>,
    pub path: Option<String>,
    #[serde(alias = "intervalMs")]
    pub interval: Option<u64>,
    #[serde(alias = "files_to_track")]
    pub tracked_files: Option<Vec<String>>,
    pub recipient: Option<String>,
}

impl ConfigRequest {
    pub fn into_target(self) -> Result<MonitorTarget, ValidationError> {
        let owner =
            non_blank(self.owner_identity).ok_or(ValidationError::missing("ownerIdentity"))?;
        let path = non_blank(self.path).ok_or(ValidationError::missing("path"))?;
        let tracked_files = self
            .tracked_files
            .ok_or(ValidationError::missing("trackedFiles"))?;
        let interval = self.interval.unwrap_or(DEFAULT_INTERVAL_MS);
        if interval == 0 {
            return Err(ValidationError::invalid("interval", "must be greater than zero"));
        }

        let mut target = MonitorTarget::new(owner, path, tracked_files).with_interval_ms(interval);
        if let Some(recipient) = non_blank(self.recipient) {
            target = target.with_recipient(recipient);
        }
        if let Some(name) = non_blank(self.name) {
            target = target.with_name(name);
        }
        target.validate()?;
        Ok(target)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigQuery {
    pub owner_identity: Option<String>,
}

/// POST /config - Store (or replace) the target for an owner.
pub async fn save_config(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ConfigRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MonitorTarget>)> {
    let target = json_body(payload)?.into_target()?;
    state.db.upsert_monitor_target(&target).await?;
    tracing::info!(owner = %target.owner_identity, path = %target.path, "monitor config saved");
    Ok((StatusCode::CREATED, Json(target)))
}

/// GET /config - Fetch the target for `ownerIdentity`, or the most recently
/// saved one.
pub async fn get_config(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConfigQuery>,
) -> ApiResult<Json<MonitorTarget>> {
    let owner = query.owner_identity.as_deref();
    state
        .db
        .find_monitor_target(owner)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(owner))
}

pub(crate) fn not_found(owner: Option<&str>) -> ApiError {
    match owner {
        Some(owner) => ApiError::NotFound(format!("no monitor config for {owner}")),
        None => ApiError::NotFound("no monitor config".to_string()),
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/config", get(get_config).post(save_config))
}
