// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use watchtower_db::Database;

use crate::auth::{PasswordHasher, TokenService, DEFAULT_TOKEN_TTL};
use crate::fanout::Fanout;
use crate::mailer::{LogMailer, Mailer};
use crate::watch::{EventPipeline, SessionManager};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Change log, monitor targets and accounts.
    pub db: Database,
    /// The single active watch session, if any.
    pub sessions: SessionManager,
    /// Connected real-time subscribers.
    pub fanout: Arc<Fanout>,
    pub passwords: PasswordHasher,
    pub tokens: TokenService,
    /// Secret an admin must present at registration. `None` disables admin
    /// registration.
    pub admin_secret: Option<String>,
}

impl AppState {
    /// State with log-only mail, a random token key and no admin secret.
    pub fn new(db: Database) -> Arc<Self> {
        Self::with_parts(
            db,
            Arc::new(LogMailer::new("watchtower@localhost")),
            TokenService::with_random_secret(DEFAULT_TOKEN_TTL),
            None,
        )
    }

    pub fn with_parts(
        db: Database,
        mailer: Arc<dyn Mailer>,
        tokens: TokenService,
        admin_secret: Option<String>,
    ) -> Arc<Self> {
        let fanout = Arc::new(Fanout::new());
        let pipeline = EventPipeline::new(db.clone(), fanout.clone(), mailer);
        Arc::new(Self {
            start_time: Instant::now(),
            db,
            sessions: SessionManager::new(pipeline),
            fanout,
            passwords: PasswordHasher::new(),
            tokens,
            admin_secret,
        })
    }

    /// Get server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
