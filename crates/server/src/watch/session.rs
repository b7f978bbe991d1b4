// crates/server/src/watch/session.rs
//! The single active watch session.
//!
//! At most one target is observed at a time. The slot is only touched through
//! [`SessionManager::start`], [`SessionManager::stop`] and
//! [`SessionManager::status`]; the notify handle never leaves this module.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::info;
use watchtower_core::{MonitorTarget, PathFilter, PatternError};

use super::adapter::{self, EventSource};
use super::pipeline::EventPipeline;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Path does not exist: {0}")]
    PathNotFound(String),

    #[error("Path is not a directory: {0}")]
    NotADirectory(String),

    #[error("No active watch session")]
    NoActiveSession,

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("Failed to start file watcher: {0}")]
    Adapter(#[from] notify::Error),
}

/// Snapshot of the session slot, as reported by `GET /status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct SessionStatus {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_identity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

impl SessionStatus {
    fn inactive() -> Self {
        Self {
            active: false,
            owner_identity: None,
            path: None,
            started_at: None,
        }
    }
}

struct WatchSession {
    target: MonitorTarget,
    root: PathBuf,
    started_at: DateTime<Utc>,
    source: EventSource,
}

impl WatchSession {
    fn status(&self) -> SessionStatus {
        SessionStatus {
            active: true,
            owner_identity: Some(self.target.owner_identity.clone()),
            path: Some(self.root.to_string_lossy().into_owned()),
            started_at: Some(self.started_at),
        }
    }

    /// Release the OS watch. Events already queued still get processed; the
    /// pipeline task exits once the channel closes.
    fn terminate(self) {
        self.source.disable();
        drop(self.source);
        info!(
            owner = %self.target.owner_identity,
            path = %self.root.display(),
            "watch session stopped"
        );
    }
}

pub struct SessionManager {
    slot: Mutex<Option<WatchSession>>,
    pipeline: EventPipeline,
}

impl SessionManager {
    pub fn new(pipeline: EventPipeline) -> Self {
        Self {
            slot: Mutex::new(None),
            pipeline,
        }
    }

    /// Begin observing `target`, replacing any session already running.
    ///
    /// The path must be an existing directory. It is checked before the
    /// current session is touched, so a bad path leaves it running.
    pub async fn start(&self, target: MonitorTarget) -> Result<SessionStatus, WatchError> {
        let root = tokio::fs::canonicalize(&target.path)
            .await
            .map_err(|_| WatchError::PathNotFound(target.path.clone()))?;
        let metadata = tokio::fs::metadata(&root)
            .await
            .map_err(|_| WatchError::PathNotFound(target.path.clone()))?;
        if !metadata.is_dir() {
            return Err(WatchError::NotADirectory(target.path.clone()));
        }
        let filter = PathFilter::new(&root, &target.tracked_files)?;

        let mut slot = self.slot.lock().await;
        if let Some(previous) = slot.take() {
            previous.terminate();
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let source = adapter::start(filter, Duration::from_millis(target.interval_ms), tx)?;
        self.pipeline.clone().spawn(rx, target.recipient.clone());

        let session = WatchSession {
            root,
            started_at: Utc::now().trunc_subsecs(3),
            source,
            target,
        };
        info!(
            owner = %session.target.owner_identity,
            path = %session.root.display(),
            tracked = session.target.tracked_files.len(),
            "watch session started"
        );
        let status = session.status();
        *slot = Some(session);
        Ok(status)
    }

    pub async fn stop(&self) -> Result<(), WatchError> {
        let mut slot = self.slot.lock().await;
        match slot.take() {
            Some(session) => {
                session.terminate();
                Ok(())
            }
            None => Err(WatchError::NoActiveSession),
        }
    }

    pub async fn status(&self) -> SessionStatus {
        self.slot
            .lock()
            .await
            .as_ref()
            .map(WatchSession::status)
            .unwrap_or_else(SessionStatus::inactive)
    }
}
