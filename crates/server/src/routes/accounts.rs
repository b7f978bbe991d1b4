// crates/server/src/routes/accounts.rs
//! Account registration, login and the token-protected profile endpoint.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use watchtower_core::{UserType, ValidationError};
use watchtower_db::{Account, NewAccount};

use super::json_body;
use crate::auth::Claims;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Header carrying the session token.
pub const TOKEN_HEADER: &str = "x-token";

const BAD_CREDENTIALS: &str = "invalid email or password";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(rename = "usertype", alias = "userType")]
    pub user_type: Option<String>,
    #[serde(rename = "secretkey", alias = "secretKey")]
    pub secret_key: Option<String>,
    #[serde(rename = "fullname", alias = "fullName")]
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "confirmpassword", alias = "confirmPassword")]
    pub confirm_password: Option<String>,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::missing(field))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub id: String,
    pub email: String,
    pub user_type: UserType,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Account as returned to its owner. Never includes the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub user_type: UserType,
    pub full_name: String,
    pub email: String,
    pub mobile: String,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for Profile {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            user_type: account.user_type,
            full_name: account.full_name,
            email: account.email,
            mobile: account.mobile,
            created_at: account.created_at,
        }
    }
}

/// POST /register - Create an account.
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let req = json_body(payload)?;

    let user_type: UserType = required(req.user_type, "usertype")?.parse()?;
    let full_name = required(req.full_name, "fullname")?;
    let email = required(req.email, "email")?;
    let mobile = required(req.mobile, "mobile")?;
    let password = req
        .password
        .filter(|p| !p.is_empty())
        .ok_or(ValidationError::missing("password"))?;
    let confirm = req
        .confirm_password
        .ok_or(ValidationError::missing("confirmpassword"))?;

    if !email.contains('@') {
        return Err(ValidationError::invalid("email", "not an email address").into());
    }
    if password != confirm {
        return Err(ValidationError::invalid("confirmpassword", "does not match password").into());
    }
    if user_type == UserType::Admin {
        match (&state.admin_secret, req.secret_key.as_deref()) {
            (Some(expected), Some(given)) if expected == given => {}
            (None, _) => {
                return Err(ApiError::Unauthorized(
                    "admin registration is disabled".to_string(),
                ))
            }
            _ => return Err(ApiError::Unauthorized("invalid admin secret key".to_string())),
        }
    }

    let hasher_state = state.clone();
    let password_hash = tokio::task::spawn_blocking(move || hasher_state.passwords.hash(&password))
        .await
        .map_err(|e| ApiError::Internal(format!("Task join error: {}", e)))??;

    let account = state
        .db
        .insert_account(&NewAccount {
            user_type,
            full_name,
            email,
            mobile,
            password_hash,
        })
        .await?;

    tracing::info!(account_id = %account.id, user_type = %account.user_type, "account registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: account.id,
            email: account.email,
            user_type: account.user_type,
        }),
    ))
}

/// POST /login - Exchange credentials for a session token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let req = json_body(payload)?;
    let email = required(req.email, "email")?;
    let password = req
        .password
        .filter(|p| !p.is_empty())
        .ok_or(ValidationError::missing("password"))?;

    let account = state
        .db
        .find_account_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(BAD_CREDENTIALS.to_string()))?;

    let verifier_state = state.clone();
    let phc = account.password_hash.clone();
    let valid =
        tokio::task::spawn_blocking(move || verifier_state.passwords.verify(&password, &phc))
            .await
            .map_err(|e| ApiError::Internal(format!("Task join error: {}", e)))??;
    if !valid {
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.to_string()));
    }

    let token = state.tokens.issue(&account.id, account.user_type)?;
    tracing::info!(account_id = %account.id, "login succeeded");
    Ok(Json(LoginResponse { token }))
}

/// Verify the `x-token` header. A missing header is a bad request; a bad
/// token is unauthorized.
pub fn require_claims(state: &AppState, headers: &HeaderMap) -> ApiResult<Claims> {
    let token = headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("token not found".to_string()))?;
    Ok(state.tokens.verify(token)?)
}

/// GET /me - Profile of the token's account.
pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<Profile>> {
    let claims = require_claims(&state, &headers)?;
    let account = state
        .db
        .find_account_by_id(&claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("account no longer exists".to_string()))?;
    Ok(Json(account.into()))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}
