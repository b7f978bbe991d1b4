/// Inline SQL migrations for the watchtower database schema.
///
/// One statement per entry; entries are applied in order and never edited
/// once released.
pub const MIGRATIONS: &[&str] = &[
    // Migration 1: append-only change log
    r#"
CREATE TABLE IF NOT EXISTS change_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    path TEXT NOT NULL,
    change_kind TEXT NOT NULL CHECK (change_kind IN ('created', 'modified', 'deleted')),
    timestamp INTEGER NOT NULL
);
"#,
    r#"
CREATE INDEX IF NOT EXISTS idx_change_events_timestamp ON change_events(timestamp DESC);
"#,
    // Migration 2: monitor target registry, keyed by owner identity
    r#"
CREATE TABLE IF NOT EXISTS monitor_targets (
    owner_identity TEXT PRIMARY KEY,
    name TEXT,
    path TEXT NOT NULL,
    interval_ms INTEGER NOT NULL,
    tracked_files TEXT NOT NULL DEFAULT '[]',
    recipient TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);
"#,
    r#"
CREATE INDEX IF NOT EXISTS idx_monitor_targets_updated ON monitor_targets(updated_at DESC);
"#,
    // Migration 3: accounts
    r#"
CREATE TABLE IF NOT EXISTS accounts (
    id TEXT PRIMARY KEY,
    user_type TEXT NOT NULL,
    full_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    mobile TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
"#,
];
