use crate::config::DatabaseConfig;
use crate::error::ApiError;
use crate::models::thought::{NewThought, Thought, MESSAGE_MAX_LENGTH, MESSAGE_MIN_LENGTH};
use crate::store::ThoughtStore;
use async_trait::async_trait;
use deadpool_postgres::{Config, Object, Pool, Runtime};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::Row;
use tracing::{error, info, warn};
use uuid::Uuid;

const THOUGHT_COLUMNS: &str = "id, message, hearts, created_at";

/// PostgreSQL-backed thought store.
/// Holds a deadpool `Pool` and hands out a connection per operation.
#[derive(Clone)]
pub struct Database {
    pool: Pool,
}

impl Database {
    /// Build the connection pool and verify it with a round trip before returning.
    pub async fn new(config: DatabaseConfig) -> Result<Self, ApiError> {
        info!("Creating PostgreSQL connection pool for host: {}:{}", config.host, config.port);

        let pool = Self::create_pool(config)?;

        let db = Database { pool };
        db.test_connection().await?;

        Ok(db)
    }

    fn create_pool(config: DatabaseConfig) -> Result<Pool, ApiError> {
        let mut pg_config = Config::new();

        pg_config.host = Some(config.host);
        pg_config.port = Some(config.port);
        pg_config.dbname = Some(config.database);
        pg_config.user = Some(config.username);
        if !config.password.is_empty() {
            pg_config.password = Some(config.password);
        }

        pg_config.ssl_mode = Some(match config.ssl_mode.as_str() {
            "disable" => deadpool_postgres::SslMode::Disable,
            "prefer" => deadpool_postgres::SslMode::Prefer,
            "require" => deadpool_postgres::SslMode::Require,
            other => {
                warn!("Unknown SSL mode '{}', defaulting to 'prefer'", other);
                deadpool_postgres::SslMode::Prefer
            }
        });

        pg_config.manager = Some(deadpool_postgres::ManagerConfig {
            recycling_method: deadpool_postgres::RecyclingMethod::Fast,
        });

        pg_config.pool = Some(deadpool_postgres::PoolConfig::new(config.max_connections as usize));

        let tls_connector = TlsConnector::builder().build().map_err(|e| {
            error!("Failed to create TLS connector: {}", e);
            ApiError::Database(format!("TLS connector creation failed: {}", e))
        })?;
        let tls = MakeTlsConnector::new(tls_connector);

        pg_config.create_pool(Some(Runtime::Tokio1), tls).map_err(|e| {
            error!("Failed to create connection pool: {}", e);
            ApiError::Database(format!("Connection pool creation failed: {}", e))
        })
    }

    async fn get_connection(&self) -> Result<Object, ApiError> {
        self.pool.get().await.map_err(ApiError::from)
    }

    /// Create the `thoughts` table and its listing index if they are missing.
    pub async fn migrate(&self) -> Result<(), ApiError> {
        info!("Running database migrations");

        let client = self.get_connection().await?;

        let enable_uuid = "CREATE EXTENSION IF NOT EXISTS \"uuid-ossp\"";
        client.execute(enable_uuid, &[]).await.map_err(|e| {
            error!("Failed to enable UUID extension: {}", e);
            ApiError::Database(format!("UUID extension error: {}", e))
        })?;

        // The CHECK mirrors the request validation bounds
        let thoughts_table = format!(
            r#"
            CREATE TABLE IF NOT EXISTS thoughts (
                id UUID PRIMARY KEY DEFAULT uuid_generate_v4(),
                message TEXT NOT NULL CHECK (char_length(message) BETWEEN {} AND {}),
                hearts BIGINT NOT NULL DEFAULT 0 CHECK (hearts >= 0),
                created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
            )
        "#,
            MESSAGE_MIN_LENGTH, MESSAGE_MAX_LENGTH
        );

        client.execute(thoughts_table.as_str(), &[]).await.map_err(|e| {
            error!("Failed to create thoughts table: {}", e);
            ApiError::Database(format!("Thoughts table creation failed: {}", e))
        })?;

        let created_index = "CREATE INDEX IF NOT EXISTS idx_thoughts_created_at ON thoughts(created_at DESC)";
        client.execute(created_index, &[]).await.map_err(|e| {
            error!("Failed to create thoughts created_at index: {}", e);
            ApiError::Database(format!("Thoughts created_at index creation failed: {}", e))
        })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Run `SELECT 1` on a pooled connection. Used right after the pool is built.
    pub async fn test_connection(&self) -> Result<(), ApiError> {
        let client = self.get_connection().await?;

        client.execute("SELECT 1", &[]).await.map_err(|e| {
            error!("Database connection test failed: {}", e);
            ApiError::Database(format!("Connection test failed: {}", e))
        })?;

        info!("Database connection test successful");
        Ok(())
    }
}

fn thought_from_row(row: &Row) -> Thought {
    Thought {
        id: row.get(0),
        message: row.get(1),
        hearts: row.get(2),
        created_at: row.get(3),
    }
}

#[async_trait]
impl ThoughtStore for Database {
    async fn list_recent(&self, limit: usize) -> Result<Vec<Thought>, ApiError> {
        let client = self.get_connection().await?;
        let query = format!(
            "SELECT {} FROM thoughts ORDER BY created_at DESC LIMIT $1",
            THOUGHT_COLUMNS
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = client.query(query.as_str(), &[&limit]).await.map_err(ApiError::from)?;

        Ok(rows.iter().map(thought_from_row).collect())
    }

    async fn insert(&self, thought: NewThought) -> Result<Thought, ApiError> {
        let client = self.get_connection().await?;
        let query = format!(
            "INSERT INTO thoughts (message) VALUES ($1) RETURNING {}",
            THOUGHT_COLUMNS
        );

        let row = client
            .query_one(query.as_str(), &[&thought.message()])
            .await
            .map_err(ApiError::from)?;

        let created = thought_from_row(&row);
        info!("Created thought with id: {}", created.id);
        Ok(created)
    }

    async fn increment_hearts(&self, id: Uuid) -> Result<Option<Thought>, ApiError> {
        let client = self.get_connection().await?;
        // Single statement so concurrent likes serialize on the row lock
        let query = format!(
            "UPDATE thoughts SET hearts = hearts + 1 WHERE id = $1 RETURNING {}",
            THOUGHT_COLUMNS
        );

        let row = client.query_opt(query.as_str(), &[&id]).await.map_err(ApiError::from)?;

        Ok(row.as_ref().map(thought_from_row))
    }

    async fn ping(&self) -> Result<(), ApiError> {
        let client = self.get_connection().await?;

        client.execute("SELECT 1", &[]).await.map_err(|e| {
            error!("Database health check failed: {}", e);
            ApiError::Database(format!("Health check failed: {}", e))
        })?;

        Ok(())
    }
}

// Run with `TEST_DATABASE_URL=postgres://... cargo test -- --ignored`
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateThoughtRequest;
    use crate::store::THOUGHTS_PAGE_SIZE;
    use std::sync::Arc;
    use tokio::sync::OnceCell;
    use tokio_test::assert_ok;

    // Concurrent CREATE EXTENSION calls race, so migrate once per test binary
    static MIGRATED: OnceCell<()> = OnceCell::const_new();

    async fn connect() -> Database {
        let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
        let config = DatabaseConfig::from_connection_string(&url).expect("invalid TEST_DATABASE_URL");
        let db = Database::new(config).await.expect("failed to connect to PostgreSQL");
        MIGRATED
            .get_or_init(|| async { db.migrate().await.expect("migration failed") })
            .await;
        db
    }

    fn new_thought(message: &str) -> NewThought {
        CreateThoughtRequest::new(message).validate().unwrap()
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL at TEST_DATABASE_URL"]
    async fn test_insert_then_list_newest_first() {
        let db = connect().await;
        let tag = Uuid::new_v4().simple().to_string();

        let mut inserted = Vec::new();
        for i in 0..3 {
            let thought = assert_ok!(db.insert(new_thought(&format!("{} #{}", tag, i))).await);
            assert_eq!(thought.hearts, 0);
            inserted.push(thought.id);
        }

        let listed = db.list_recent(THOUGHTS_PAGE_SIZE).await.unwrap();
        assert!(listed.len() <= THOUGHTS_PAGE_SIZE);
        assert!(listed.windows(2).all(|w| w[0].created_at >= w[1].created_at));

        // Our own rows come back newest first relative to each other
        let ours: Vec<Uuid> = listed
            .iter()
            .filter(|t| t.message.starts_with(&tag))
            .map(|t| t.id)
            .collect();
        inserted.reverse();
        assert_eq!(ours, inserted);
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL at TEST_DATABASE_URL"]
    async fn test_concurrent_increments_are_not_lost() {
        let db = Arc::new(connect().await);
        let thought = db.insert(new_thought("hello world")).await.unwrap();

        let tasks: Vec<_> = (0..40)
            .map(|_| {
                let db = Arc::clone(&db);
                tokio::spawn(async move { db.increment_hearts(thought.id).await })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().unwrap().is_some());
        }

        let liked = db.increment_hearts(thought.id).await.unwrap().unwrap();
        assert_eq!(liked.hearts, 41);
        assert_eq!(liked.created_at, thought.created_at);
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL at TEST_DATABASE_URL"]
    async fn test_increment_unknown_id() {
        let db = connect().await;
        assert!(db.increment_hearts(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL at TEST_DATABASE_URL"]
    async fn test_check_constraint_maps_to_validation() {
        let db = connect().await;
        let client = db.get_connection().await.unwrap();

        let err = client
            .query_one("INSERT INTO thoughts (message) VALUES ($1) RETURNING id", &[&"hey"])
            .await
            .map_err(ApiError::from)
            .unwrap_err();

        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL at TEST_DATABASE_URL"]
    async fn test_ping() {
        let db = connect().await;
        assert_ok!(db.ping().await);
    }
}
