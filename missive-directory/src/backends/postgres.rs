use std::time::Duration;

use async_trait::async_trait;
use missive_common::{Sender, internal};
use sqlx::{
    FromRow, PgPool,
    postgres::PgPoolOptions,
};

use crate::{DirectoryError, PostgresConfig, Result, r#trait::SenderDirectory};

/// Statements creating the sender table and the job log table, in order.
///
/// Every statement is idempotent so the migration can run on every deploy.
const MIGRATIONS: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS senders (
        id SERIAL PRIMARY KEY,
        app_tag VARCHAR(50) NOT NULL UNIQUE,
        email VARCHAR(255) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    ",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_senders_app_tag ON senders (app_tag)",
    r"
    CREATE TABLE IF NOT EXISTS mail_jobs (
        id SERIAL PRIMARY KEY,
        recipients TEXT[] NOT NULL,
        cc_recipients TEXT[],
        bcc_recipients TEXT[],
        subject TEXT NOT NULL,
        body_content TEXT,
        html_body_content TEXT,
        app_tag VARCHAR(50) NOT NULL,
        status VARCHAR(20) NOT NULL DEFAULT 'queued',
        error_message TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        processed_at TIMESTAMPTZ
    )
    ",
];

#[derive(Debug, FromRow)]
struct SenderRow {
    id: i32,
    app_tag: String,
    email: String,
}

impl From<SenderRow> for Sender {
    fn from(row: SenderRow) -> Self {
        Self {
            id: i64::from(row.id),
            app_tag: row.app_tag,
            email: row.email,
        }
    }
}

/// Sender directory backed by the Postgres `senders` table
#[derive(Debug, Clone)]
pub struct PostgresDirectory {
    pool: PgPool,
}

impl PostgresDirectory {
    /// Open a connection pool to the configured database
    ///
    /// # Errors
    /// Returns [`DirectoryError::Database`] if no connection could be made
    pub async fn connect(config: &PostgresConfig) -> Result<Self> {
        internal!(
            "Connecting to sender directory (max_connections={})",
            config.max_connections
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await?;

        Ok(Self::from_pool(pool))
    }

    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the tables and indexes the pipeline relies on
    ///
    /// # Errors
    /// Returns [`DirectoryError::Database`] if any statement fails
    pub async fn migrate(&self) -> Result<()> {
        for statement in MIGRATIONS {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        internal!("Sender directory schema is up to date");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl SenderDirectory for PostgresDirectory {
    async fn find_by_tag(&self, app_tag: &str) -> Result<Option<Sender>> {
        let row = sqlx::query_as::<_, SenderRow>(
            "SELECT id, app_tag, email FROM senders WHERE app_tag = $1",
        )
        .bind(app_tag)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Sender::from))
    }

    async fn create(&self, app_tag: &str, email: &str) -> Result<Sender> {
        let row = sqlx::query_as::<_, SenderRow>(
            "INSERT INTO senders (app_tag, email) VALUES ($1, $2) RETURNING id, app_tag, email",
        )
        .bind(app_tag)
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                DirectoryError::AlreadyExists(app_tag.to_string())
            }
            other => DirectoryError::Database(other),
        })?;

        Ok(row.into())
    }

    async fn list(&self) -> Result<Vec<Sender>> {
        let rows = sqlx::query_as::<_, SenderRow>(
            "SELECT id, app_tag, email FROM senders ORDER BY app_tag",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Sender::from).collect())
    }

    async fn delete(&self, app_tag: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM senders WHERE app_tag = $1")
            .bind(app_tag)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
