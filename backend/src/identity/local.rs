use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::Row;
use tracing::info;
use uuid::Uuid;

use crate::identity::{IdentityError, IdentityProvider};
use crate::storage::DbConnection;

const MIN_PASSWORD_LEN: usize = 6;

/// Identity provider backed by the local document store.
///
/// Credentials are stored as salted SHA-256 digests; bearer tokens are
/// opaque UUIDs, persisted as digests with a bounded lifetime.
#[derive(Clone)]
pub struct LocalIdentityProvider {
    db: DbConnection,
    session_ttl_hours: i64,
}

impl LocalIdentityProvider {
    pub fn new(db: DbConnection, session_ttl_hours: i64) -> Self {
        Self {
            db,
            session_ttl_hours,
        }
    }

    fn password_digest(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn token_digest(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn now_unix() -> i64 {
        time::OffsetDateTime::now_utc().unix_timestamp()
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<String, IdentityError> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(IdentityError::WeakPassword);
        }

        let existing = sqlx::query("SELECT 1 FROM identities WHERE email = ?")
            .bind(email)
            .fetch_optional(self.db.pool())
            .await?;
        if existing.is_some() {
            return Err(IdentityError::EmailTaken);
        }

        let identity_id = Uuid::new_v4().to_string();
        let salt = Uuid::new_v4().to_string();
        let hash = Self::password_digest(&salt, password);

        sqlx::query(
            r#"
            INSERT INTO identities (id, email, password_salt, password_hash, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&identity_id)
        .bind(email)
        .bind(&salt)
        .bind(&hash)
        .bind(Utc::now().to_rfc3339())
        .execute(self.db.pool())
        .await?;

        info!("Created identity {} for {}", identity_id, email);
        Ok(identity_id)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<String, IdentityError> {
        let row = sqlx::query(
            r#"
            SELECT id, password_salt, password_hash
            FROM identities
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(self.db.pool())
        .await?;

        // Unknown email and wrong password report the same error
        let row = row.ok_or(IdentityError::InvalidCredentials)?;
        let salt: String = row.get("password_salt");
        let stored: String = row.get("password_hash");

        if Self::password_digest(&salt, password) != stored {
            return Err(IdentityError::InvalidCredentials);
        }

        Ok(row.get("id"))
    }

    async fn delete_account(&self, identity_id: &str) -> Result<(), IdentityError> {
        sqlx::query("DELETE FROM identities WHERE id = ?")
            .bind(identity_id)
            .execute(self.db.pool())
            .await?;
        info!("Deleted identity {}", identity_id);
        Ok(())
    }

    async fn issue_token(&self, identity_id: &str) -> Result<String, IdentityError> {
        let token = Uuid::new_v4().to_string();
        let expires_at = Self::now_unix() + self.session_ttl_hours * 3600;

        sqlx::query(
            r#"
            INSERT INTO sessions (token_hash, identity_id, created_at, expires_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(Self::token_digest(&token))
        .bind(identity_id)
        .bind(Utc::now().to_rfc3339())
        .bind(expires_at)
        .execute(self.db.pool())
        .await?;

        Ok(token)
    }

    async fn verify_token(&self, token: &str) -> Result<String, IdentityError> {
        let token_hash = Self::token_digest(token);

        let row = sqlx::query(
            r#"
            SELECT identity_id, expires_at
            FROM sessions
            WHERE token_hash = ?
            "#,
        )
        .bind(&token_hash)
        .fetch_optional(self.db.pool())
        .await?;

        let row = row.ok_or(IdentityError::InvalidToken)?;
        let expires_at: i64 = row.get("expires_at");

        if expires_at < Self::now_unix() {
            sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
                .bind(&token_hash)
                .execute(self.db.pool())
                .await?;
            return Err(IdentityError::InvalidToken);
        }

        Ok(row.get("identity_id"))
    }

    async fn revoke_token(&self, token: &str) -> Result<(), IdentityError> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(Self::token_digest(token))
            .execute(self.db.pool())
            .await?;
        Ok(())
    }
}
