use anyhow::Result;
use sqlx::Row;

use crate::storage::db::DbConnection;
use shared::Child;

/// Repository for child documents, always scoped to an owning user
#[derive(Clone)]
pub struct ChildRepository {
    db: DbConnection,
}

impl ChildRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Store a child in the database
    pub async fn store_child(&self, child: &Child) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO children (id, user_id, name, birthdate, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&child.id)
        .bind(&child.user_id)
        .bind(&child.name)
        .bind(&child.birthdate)
        .bind(&child.created_at)
        .bind(&child.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Get a child by ID, only if it belongs to the given user
    pub async fn get_child(&self, user_id: &str, child_id: &str) -> Result<Option<Child>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, name, birthdate, created_at, updated_at
            FROM children
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(child_id)
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(r) => Ok(Some(Self::row_to_child(&r))),
            None => Ok(None),
        }
    }

    /// List the user's children ordered by name
    pub async fn list_children(&self, user_id: &str) -> Result<Vec<Child>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, name, birthdate, created_at, updated_at
            FROM children
            WHERE user_id = ?
            ORDER BY name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(Self::row_to_child).collect())
    }

    /// Update a child in the database
    pub async fn update_child(&self, child: &Child) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE children
            SET name = ?, birthdate = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&child.name)
        .bind(&child.birthdate)
        .bind(&child.updated_at)
        .bind(&child.id)
        .bind(&child.user_id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Delete a child from the database
    pub async fn delete_child(&self, user_id: &str, child_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM children WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(child_id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    fn row_to_child(row: &sqlx::sqlite::SqliteRow) -> Child {
        Child {
            id: row.get("id"),
            user_id: row.get("user_id"),
            name: row.get("name"),
            birthdate: row.get("birthdate"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}
