use anyhow::Result;
use sqlx::Row;

use crate::storage::db::DbConnection;
use shared::{HistoryRecord, PresenceStatus, TransitionRecord};

/// Repository for the append-only presence transition log
#[derive(Clone)]
pub struct TransitionRepository {
    db: DbConnection,
}

impl TransitionRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Append one transition to the log, returning the stored record
    pub async fn append_transition(
        &self,
        child_id: &str,
        guest_id: &str,
        from_status: PresenceStatus,
        to_status: PresenceStatus,
        timestamp: &str,
    ) -> Result<TransitionRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO transitions (child_id, guest_id, from_status, to_status, timestamp)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(child_id)
        .bind(guest_id)
        .bind(from_status.as_str())
        .bind(to_status.as_str())
        .bind(timestamp)
        .execute(self.db.pool())
        .await?;

        Ok(TransitionRecord {
            id: result.last_insert_rowid(),
            child_id: child_id.to_string(),
            guest_id: guest_id.to_string(),
            from_status,
            to_status,
            timestamp: timestamp.to_string(),
        })
    }

    /// List all transitions recorded for a guest, newest first
    pub async fn list_for_guest(&self, guest_id: &str) -> Result<Vec<TransitionRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, child_id, guest_id, from_status, to_status, timestamp
            FROM transitions
            WHERE guest_id = ?
            ORDER BY timestamp DESC, id DESC
            "#,
        )
        .bind(guest_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter()
            .map(|row| {
                let from: String = row.get("from_status");
                let to: String = row.get("to_status");
                Ok(TransitionRecord {
                    id: row.get("id"),
                    child_id: row.get("child_id"),
                    guest_id: row.get("guest_id"),
                    from_status: PresenceStatus::parse(&from)?,
                    to_status: PresenceStatus::parse(&to)?,
                    timestamp: row.get("timestamp"),
                })
            })
            .collect()
    }

    /// Project every transition across the user's children into history rows,
    /// tagged with child and guest names. Newest first; ties broken by the
    /// log's insertion order (row id), newest insertion first.
    pub async fn list_history(&self, user_id: &str) -> Result<Vec<HistoryRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT t.to_status, t.timestamp, c.name AS child_name, g.name AS guest_name
            FROM transitions t
            JOIN guests g ON g.id = t.guest_id
            JOIN children c ON c.id = t.child_id
            WHERE c.user_id = ?
            ORDER BY t.timestamp DESC, t.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter()
            .map(|row| {
                let status: String = row.get("to_status");
                Ok(HistoryRecord {
                    child_name: row.get("child_name"),
                    guest_name: row.get("guest_name"),
                    status: PresenceStatus::parse(&status)?,
                    timestamp: row.get("timestamp"),
                })
            })
            .collect()
    }
}
