// crates/db/src/queries/mod.rs
// Query methods on `Database`, one module per table.

pub mod accounts;
mod change_events;
mod monitor_targets;

use chrono::{DateTime, Utc};

use crate::DbError;

/// Convert a stored unix-millis column back into a timestamp.
pub(crate) fn millis_to_datetime(
    table: &'static str,
    millis: i64,
) -> Result<DateTime<Utc>, DbError> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| DbError::Corrupt {
        table,
        reason: format!("timestamp out of range: {millis}"),
    })
}
