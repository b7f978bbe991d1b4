// crates/server/src/config.rs
//! Command-line and environment configuration for the server binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Default port for the server.
pub const DEFAULT_PORT: u16 = 3000;

/// Default allowed browser origin.
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

/// Watch a directory tree and report every file change.
#[derive(Debug, Clone, Parser)]
#[command(name = "watchtower", version, about)]
pub struct ServerConfig {
    /// Port to listen on
    #[arg(long, env = "WATCHTOWER_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// SQLite database file (defaults to the user cache directory)
    #[arg(long, env = "WATCHTOWER_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Secret used to sign session tokens. A random one is generated when
    /// absent, which invalidates tokens on restart.
    #[arg(long, env = "WATCHTOWER_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Lifetime of issued session tokens, in seconds
    #[arg(long, env = "WATCHTOWER_TOKEN_TTL_SECS", default_value_t = 3600)]
    pub token_ttl_secs: u64,

    /// Shared secret required to register an admin account. Admin
    /// registration is disabled without it.
    #[arg(long, env = "WATCHTOWER_ADMIN_SECRET", hide_env_values = true)]
    pub admin_secret: Option<String>,

    /// Allowed CORS origin ("*" for any)
    #[arg(long, env = "WATCHTOWER_CORS_ORIGIN", default_value = DEFAULT_CORS_ORIGIN)]
    pub cors_origin: String,

    /// HTTP endpoint that relays alert mail. Alerts are only logged without it.
    #[arg(long, env = "WATCHTOWER_MAIL_WEBHOOK")]
    pub mail_webhook: Option<String>,

    /// Sender address on alert mail
    #[arg(long, env = "WATCHTOWER_MAIL_FROM", default_value = "watchtower@localhost")]
    pub mail_from: String,
}

impl ServerConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}
