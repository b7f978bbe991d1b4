// crates/core/src/types.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Poll interval used when a target does not specify one.
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// Kind of filesystem mutation observed under a watched root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Created => "created",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(ChangeKind::Created),
            "modified" => Ok(ChangeKind::Modified),
            "deleted" => Ok(ChangeKind::Deleted),
            other => Err(ValidationError::invalid(
                "changeKind",
                format!("unknown change kind '{other}'"),
            )),
        }
    }
}

/// A single observed change. Immutable once recorded.
///
/// This is also the wire format pushed to real-time subscribers:
/// `{"path": "...", "changeKind": "created", "timestamp": "2024-..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub path: String,
    pub change_kind: ChangeKind,
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(path: impl Into<String>, change_kind: ChangeKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            change_kind,
            timestamp,
        }
    }

    /// Stamp an event with the current wall-clock time, truncated to the
    /// millisecond resolution the change log stores.
    pub fn now(path: impl Into<String>, change_kind: ChangeKind) -> Self {
        Self::new(path, change_kind, Utc::now().trunc_subsecs(3))
    }

    /// One-line human summary, used for alert bodies and logs.
    pub fn summary(&self) -> String {
        format!(
            "File {} on {} at {}",
            self.change_kind,
            self.path,
            self.timestamp.to_rfc3339()
        )
    }
}

/// A directory tree to observe, plus the settings that go with it.
///
/// `owner_identity` (the owner's email) is the natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorTarget {
    pub owner_identity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub path: String,
    pub interval_ms: u64,
    pub tracked_files: Vec<String>,
    pub recipient: String,
}

impl MonitorTarget {
    /// Build a target whose alert recipient is the owner and whose
    /// interval is the default.
    pub fn new(
        owner_identity: impl Into<String>,
        path: impl Into<String>,
        tracked_files: Vec<String>,
    ) -> Self {
        let owner_identity = owner_identity.into();
        Self {
            recipient: owner_identity.clone(),
            owner_identity,
            name: None,
            path: path.into(),
            interval_ms: DEFAULT_INTERVAL_MS,
            tracked_files,
        }
    }

    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = recipient.into();
        self
    }

    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Check the fields the registry requires before storing.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.owner_identity.trim().is_empty() {
            return Err(ValidationError::missing("ownerIdentity"));
        }
        if self.path.trim().is_empty() {
            return Err(ValidationError::missing("path"));
        }
        if self.recipient.trim().is_empty() {
            return Err(ValidationError::missing("recipient"));
        }
        if self.tracked_files.iter().any(|p| p.trim().is_empty()) {
            return Err(ValidationError::invalid(
                "trackedFiles",
                "patterns must not be blank",
            ));
        }
        Ok(())
    }
}

/// Account role, carried as the `role` claim in issued tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    User,
    Admin,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::User => "user",
            UserType::Admin => "admin",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(UserType::User),
            "admin" => Ok(UserType::Admin),
            other => Err(ValidationError::invalid(
                "usertype",
                format!("unknown user type '{other}'"),
            )),
        }
    }
}
