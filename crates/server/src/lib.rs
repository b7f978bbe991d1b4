// crates/server/src/lib.rs
//! Watchtower server library.
//!
//! Axum HTTP + WebSocket server that watches one directory tree at a time,
//! records every file change, pushes it to connected clients and mails an
//! alert to the target's recipient.

pub mod auth;
pub mod config;
pub mod error;
pub mod fanout;
pub mod mailer;
pub mod routes;
pub mod state;
pub mod watch;

pub use config::ServerConfig;
pub use error::*;
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
///
/// `cors_origin` is a single allowed origin, or `*` for any.
pub fn create_app(state: Arc<AppState>, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allow_origin(cors_origin))
        .allow_methods(Any)
        .allow_headers(Any);

    api_routes(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn allow_origin(origin: &str) -> AllowOrigin {
    if origin.trim() == "*" {
        return AllowOrigin::any();
    }
    match HeaderValue::from_str(origin.trim()) {
        Ok(value) => AllowOrigin::exact(value),
        Err(_) => {
            tracing::warn!(origin = %origin, "Invalid CORS origin; allowing any");
            AllowOrigin::any()
        }
    }
}
