//! Centralized path functions for all app storage locations.

use std::path::PathBuf;

/// App cache root: `~/Library/Caches/watchtower/` (macOS) or `~/.cache/watchtower/` (Linux).
pub fn app_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("watchtower"))
}

/// SQLite database file: `<app_cache_dir>/watchtower.db`.
pub fn db_path() -> Option<PathBuf> {
    app_cache_dir().map(|d| d.join("watchtower.db"))
}
