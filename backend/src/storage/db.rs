use anyhow::Result;
use chrono::Utc;
use sqlx::{migrate::MigrateDatabase, Row, Sqlite, SqlitePool};
use std::sync::Arc;

/// Snapshot of the diagnostics document written by [`DbConnection::ping`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct DiagnosticsDoc {
    pub timestamp: String,
    pub status: String,
}

/// DbConnection manages the document store connection and schema
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new connection, creating the database and schema if needed
    pub async fn new(url: &str) -> Result<Self> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?
        }

        let pool = SqlitePool::connect(url).await?;

        Self::setup_schema(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        // Identity provider tables: credentials and bearer sessions
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS identities (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_salt TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                token_hash TEXT PRIMARY KEY,
                identity_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                expires_at INTEGER NOT NULL,
                FOREIGN KEY (identity_id) REFERENCES identities (id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_sessions_identity_id
            ON sessions(identity_id);
            "#,
        )
        .execute(pool)
        .await?;

        // Profile documents
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                username TEXT NOT NULL UNIQUE,
                role TEXT NOT NULL DEFAULT 'user',
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                phone TEXT NOT NULL DEFAULT '',
                language TEXT NOT NULL DEFAULT 'sv',
                notifications INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        // Children, scoped to their owning user
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS children (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                birthdate TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_children_user_id
            ON children(user_id);
            "#,
        )
        .execute(pool)
        .await?;

        // Guests, scoped to their child
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS guests (
                id TEXT PRIMARY KEY,
                child_id TEXT NOT NULL,
                name TEXT NOT NULL,
                contact_kind TEXT NOT NULL,
                contact_value TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'out',
                timestamp TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (child_id) REFERENCES children (id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_guests_child_id
            ON guests(child_id);
            "#,
        )
        .execute(pool)
        .await?;

        // Append-only presence transition log
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transitions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                child_id TEXT NOT NULL,
                guest_id TEXT NOT NULL,
                from_status TEXT NOT NULL,
                to_status TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                FOREIGN KEY (guest_id) REFERENCES guests (id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_transitions_timestamp
            ON transitions(timestamp DESC, id DESC);
            "#,
        )
        .execute(pool)
        .await?;

        // Single-row diagnostics document for connection checks
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS diagnostics (
                id TEXT PRIMARY KEY,
                timestamp TEXT NOT NULL,
                status TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Write the diagnostics document and read it back, verifying the store
    /// answers both operations
    pub async fn ping(&self) -> Result<DiagnosticsDoc> {
        let timestamp = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO diagnostics (id, timestamp, status)
            VALUES ('connection', ?, 'connected')
            "#,
        )
        .bind(&timestamp)
        .execute(&*self.pool)
        .await?;

        let row = sqlx::query(
            r#"
            SELECT timestamp, status
            FROM diagnostics
            WHERE id = 'connection'
            "#,
        )
        .fetch_one(&*self.pool)
        .await?;

        Ok(DiagnosticsDoc {
            timestamp: row.get("timestamp"),
            status: row.get("status"),
        })
    }
}
