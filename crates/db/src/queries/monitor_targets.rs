//! Monitor target registry (one row per owner identity).

use chrono::Utc;
use sqlx::Row;
use watchtower_core::MonitorTarget;

use crate::{Database, DbError, DbResult};

struct MonitorTargetRow {
    owner_identity: String,
    name: Option<String>,
    path: String,
    interval_ms: i64,
    tracked_files: String,
    recipient: String,
}

impl<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> for MonitorTargetRow {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            owner_identity: row.try_get("owner_identity")?,
            name: row.try_get("name")?,
            path: row.try_get("path")?,
            interval_ms: row.try_get("interval_ms")?,
            tracked_files: row.try_get("tracked_files")?,
            recipient: row.try_get("recipient")?,
        })
    }
}

impl TryFrom<MonitorTargetRow> for MonitorTarget {
    type Error = DbError;

    fn try_from(row: MonitorTargetRow) -> Result<Self, Self::Error> {
        let tracked_files: Vec<String> =
            serde_json::from_str(&row.tracked_files).map_err(|e| DbError::Corrupt {
                table: "monitor_targets",
                reason: format!("tracked_files is not a JSON string array: {e}"),
            })?;
        Ok(MonitorTarget {
            owner_identity: row.owner_identity,
            name: row.name,
            path: row.path,
            interval_ms: row.interval_ms.max(0) as u64,
            tracked_files,
            recipient: row.recipient,
        })
    }
}

impl Database {
    /// Insert or replace the target for `target.owner_identity`.
    ///
    /// Fails with `DbError::Validation` before touching storage when a
    /// required field is blank.
    pub async fn upsert_monitor_target(&self, target: &MonitorTarget) -> DbResult<()> {
        target.validate()?;

        let tracked_files = serde_json::to_string(&target.tracked_files).map_err(|e| {
            DbError::Corrupt {
                table: "monitor_targets",
                reason: format!("cannot encode tracked_files: {e}"),
            }
        })?;

        sqlx::query(
            "INSERT INTO monitor_targets
                (owner_identity, name, path, interval_ms, tracked_files, recipient, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(owner_identity) DO UPDATE SET
                name = excluded.name,
                path = excluded.path,
                interval_ms = excluded.interval_ms,
                tracked_files = excluded.tracked_files,
                recipient = excluded.recipient,
                updated_at = excluded.updated_at",
        )
        .bind(&target.owner_identity)
        .bind(&target.name)
        .bind(&target.path)
        .bind(target.interval_ms.min(i64::MAX as u64) as i64)
        .bind(tracked_files)
        .bind(&target.recipient)
        .bind(Utc::now().timestamp_millis())
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Look up a target by owner identity.
    ///
    /// With no identity, returns the most recently updated target.
    pub async fn find_monitor_target(
        &self,
        owner_identity: Option<&str>,
    ) -> DbResult<Option<MonitorTarget>> {
        let row: Option<MonitorTargetRow> = match owner_identity {
            Some(owner) => {
                sqlx::query_as(
                    "SELECT owner_identity, name, path, interval_ms, tracked_files, recipient
                     FROM monitor_targets
                     WHERE owner_identity = ?",
                )
                .bind(owner)
                .fetch_optional(self.pool())
                .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT owner_identity, name, path, interval_ms, tracked_files, recipient
                     FROM monitor_targets
                     ORDER BY updated_at DESC, rowid DESC
                     LIMIT 1",
                )
                .fetch_optional(self.pool())
                .await?
            }
        };

        row.map(MonitorTarget::try_from).transpose()
    }
}
