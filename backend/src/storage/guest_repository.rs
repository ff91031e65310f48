use anyhow::Result;
use sqlx::Row;

use crate::storage::db::DbConnection;
use shared::{Guest, GuestContact, PresenceStatus};

/// Repository for guest documents, always scoped to their child
#[derive(Clone)]
pub struct GuestRepository {
    db: DbConnection,
}

impl GuestRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Store a guest in the database
    pub async fn store_guest(&self, guest: &Guest) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO guests (id, child_id, name, contact_kind, contact_value, status, timestamp, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&guest.id)
        .bind(&guest.child_id)
        .bind(&guest.name)
        .bind(guest.contact.kind())
        .bind(guest.contact.value())
        .bind(guest.status.as_str())
        .bind(&guest.timestamp)
        .bind(&guest.created_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Get a guest by ID, only if it is registered under the given child
    pub async fn get_guest(&self, child_id: &str, guest_id: &str) -> Result<Option<Guest>> {
        let row = sqlx::query(
            r#"
            SELECT id, child_id, name, contact_kind, contact_value, status, timestamp, created_at
            FROM guests
            WHERE id = ? AND child_id = ?
            "#,
        )
        .bind(guest_id)
        .bind(child_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(Self::row_to_guest).transpose()
    }

    /// List all guests under a child, ordered by name
    pub async fn list_guests(&self, child_id: &str) -> Result<Vec<Guest>> {
        let rows = sqlx::query(
            r#"
            SELECT id, child_id, name, contact_kind, contact_value, status, timestamp, created_at
            FROM guests
            WHERE child_id = ?
            ORDER BY name ASC
            "#,
        )
        .bind(child_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(Self::row_to_guest).collect()
    }

    /// Persist a guest's status and transition timestamp
    pub async fn update_status(&self, guest: &Guest) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE guests
            SET status = ?, timestamp = ?
            WHERE id = ? AND child_id = ?
            "#,
        )
        .bind(guest.status.as_str())
        .bind(&guest.timestamp)
        .bind(&guest.id)
        .bind(&guest.child_id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    fn row_to_guest(row: sqlx::sqlite::SqliteRow) -> Result<Guest> {
        let contact_kind: String = row.get("contact_kind");
        let contact_value: String = row.get("contact_value");
        let status: String = row.get("status");

        Ok(Guest {
            id: row.get("id"),
            child_id: row.get("child_id"),
            name: row.get("name"),
            contact: GuestContact::from_parts(&contact_kind, &contact_value)?,
            status: PresenceStatus::parse(&status)?,
            timestamp: row.get("timestamp"),
            created_at: row.get("created_at"),
        })
    }
}
