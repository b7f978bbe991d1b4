// crates/server/src/main.rs
//! Watchtower server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use watchtower_db::Database;
use watchtower_server::auth::TokenService;
use watchtower_server::mailer::{LogMailer, Mailer, WebhookMailer};
use watchtower_server::{create_app, AppState, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,watchtower_server=info,watchtower_db=info".into()),
        )
        .init();

    let config = ServerConfig::parse();

    let db = match &config.db_path {
        Some(path) => Database::new(path).await?,
        None => Database::open_default().await?,
    };
    info!(path = %db.db_path().display(), "database ready");

    let mailer: Arc<dyn Mailer> = match &config.mail_webhook {
        Some(endpoint) => {
            info!(endpoint = %endpoint, "alert mail via webhook");
            Arc::new(WebhookMailer::new(endpoint, &config.mail_from))
        }
        None => Arc::new(LogMailer::new(&config.mail_from)),
    };

    let tokens = match &config.secret_key {
        Some(secret) => TokenService::new(secret.as_bytes(), config.token_ttl()),
        None => {
            warn!("WATCHTOWER_SECRET_KEY not set; tokens will not survive a restart");
            TokenService::with_random_secret(config.token_ttl())
        }
    };

    let state = AppState::with_parts(db, mailer, tokens, config.admin_secret.clone());
    let app = create_app(state, &config.cors_origin);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running on http://localhost:{}", config.port);
    axum::serve(listener, app).await?;

    Ok(())
}
