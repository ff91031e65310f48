use anyhow::Result;
use sqlx::Row;

use crate::storage::db::DbConnection;
use shared::{Role, UserProfile};

/// Repository for user profile documents
#[derive(Clone)]
pub struct UserRepository {
    db: DbConnection,
}

impl UserRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Store a new user profile
    pub async fn store_user(&self, user: &UserProfile) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, username, role, first_name, last_name, phone, language, notifications, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(user.role.as_str())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(&user.language)
        .bind(user.notifications)
        .bind(&user.created_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Get a user profile by ID
    pub async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, username, role, first_name, last_name, phone, language, notifications, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(Self::row_to_user).transpose()
    }

    /// Find a user profile by email (equality query)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, username, role, first_name, last_name, phone, language, notifications, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(Self::row_to_user).transpose()
    }

    /// Find a user profile by username (equality query)
    pub async fn find_by_username(&self, username: &str) -> Result<Option<UserProfile>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, username, role, first_name, last_name, phone, language, notifications, created_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(Self::row_to_user).transpose()
    }

    /// Update the mutable profile fields of a user
    pub async fn update_user(&self, user: &UserProfile) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET first_name = ?, last_name = ?, phone = ?, language = ?, notifications = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(&user.language)
        .bind(user.notifications)
        .bind(&user.id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    fn row_to_user(row: sqlx::sqlite::SqliteRow) -> Result<UserProfile> {
        let role: String = row.get("role");
        Ok(UserProfile {
            id: row.get("id"),
            email: row.get("email"),
            username: row.get("username"),
            role: Role::parse(&role)?,
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
            phone: row.get("phone"),
            language: row.get("language"),
            notifications: row.get("notifications"),
            created_at: row.get("created_at"),
        })
    }
}
