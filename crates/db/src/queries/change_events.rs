//! Append-only change log.

use sqlx::Row;
use watchtower_core::{ChangeEvent, ChangeKind};

use super::millis_to_datetime;
use crate::{Database, DbError, DbResult};

struct ChangeEventRow {
    path: String,
    change_kind: String,
    timestamp: i64,
}

impl<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> for ChangeEventRow {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            path: row.try_get("path")?,
            change_kind: row.try_get("change_kind")?,
            timestamp: row.try_get("timestamp")?,
        })
    }
}

impl TryFrom<ChangeEventRow> for ChangeEvent {
    type Error = DbError;

    fn try_from(row: ChangeEventRow) -> Result<Self, Self::Error> {
        let change_kind: ChangeKind = row.change_kind.parse().map_err(|_| DbError::Corrupt {
            table: "change_events",
            reason: format!("unknown change kind '{}'", row.change_kind),
        })?;
        Ok(ChangeEvent::new(
            row.path,
            change_kind,
            millis_to_datetime("change_events", row.timestamp)?,
        ))
    }
}

impl Database {
    /// Persist one observed change. Returns the new row id.
    pub async fn append_change_event(&self, event: &ChangeEvent) -> DbResult<i64> {
        let result = sqlx::query(
            "INSERT INTO change_events (path, change_kind, timestamp) VALUES (?, ?, ?)",
        )
        .bind(&event.path)
        .bind(event.change_kind.as_str())
        .bind(event.timestamp.timestamp_millis())
        .execute(self.pool())
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Every stored change, newest first.
    ///
    /// Events recorded within the same millisecond come back in reverse
    /// insertion order.
    pub async fn list_recent_change_events(&self) -> DbResult<Vec<ChangeEvent>> {
        let rows: Vec<ChangeEventRow> = sqlx::query_as(
            "SELECT path, change_kind, timestamp
             FROM change_events
             ORDER BY timestamp DESC, id DESC",
        )
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(ChangeEvent::try_from).collect()
    }

    /// Number of stored changes.
    pub async fn count_change_events(&self) -> DbResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM change_events")
            .fetch_one(self.pool())
            .await?;
        Ok(row.0)
    }
}
