use anyhow::Result;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::sync::Arc;

// The database URL for the production database
const DATABASE_URL: &str = "sqlite:points.db";

/// DbConnection manages the SQLite pool shared by all repositories.
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection
    pub async fn new(url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?
        }

        let pool = SqlitePool::connect(url).await?;

        Self::setup_schema(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Initialize the standard database
    pub async fn init() -> Result<Self> {
        Self::new(DATABASE_URL).await
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        // Generate a unique database name for tests
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS children (
                id TEXT PRIMARY KEY,
                legacy_uid TEXT UNIQUE,
                family_id TEXT NOT NULL,
                name TEXT NOT NULL,
                nickname TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        // Current ledger table (field name: delta)
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS points_ledger (
                id TEXT PRIMARY KEY,
                child_id TEXT NOT NULL,
                delta INTEGER NOT NULL,
                reason TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        // Pre-migration ledger table (field names: points, note)
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS child_points_ledger (
                id TEXT PRIMARY KEY,
                child_uid TEXT NOT NULL,
                points INTEGER NOT NULL,
                note TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reward_offers (
                id TEXT PRIMARY KEY,
                child_id TEXT NOT NULL,
                reward_id TEXT,
                status TEXT NOT NULL,
                points_cost INTEGER,
                points_cost_override INTEGER,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rewards (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                points_cost INTEGER NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS wallet_rollups (
                child_id TEXT PRIMARY KEY,
                lifetime_earned_pts INTEGER NOT NULL,
                spent_cashout_pts INTEGER NOT NULL,
                reserved_pts INTEGER NOT NULL,
                spent_total_pts INTEGER NOT NULL,
                available_pts INTEGER NOT NULL,
                balance_pts INTEGER NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        // Backs the atomic award-if-new operation
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ledger_idempotency (
                idem_key TEXT PRIMARY KEY,
                ledger_id TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_points_ledger_child
            ON points_ledger(child_id, created_at);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_child_points_ledger_child
            ON child_points_ledger(child_uid, created_at);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_reward_offers_child_status
            ON reward_offers(child_id, status);
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}
