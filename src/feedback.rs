//! Persistence for image relevance feedback.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    #[error("feedback storage failed: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackRecord {
    pub image_url: String,
    pub query: String,
    pub relevant: bool,
    pub timestamp: DateTime<Utc>,
}

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn record(&self, record: &FeedbackRecord) -> Result<(), FeedbackError>;
}

#[derive(Debug, Clone)]
pub struct SqliteFeedbackStore {
    pool: SqlitePool,
}

impl SqliteFeedbackStore {
    pub async fn connect(url: &str) -> Result<Self, FeedbackError> {
        let in_memory = url.contains(":memory:");
        let mut options = SqlitePoolOptions::new().max_connections(if in_memory { 1 } else { 5 });
        if in_memory {
            // An in-memory database lives only as long as its connection.
            options = options.idle_timeout(None).max_lifetime(None);
        }
        let pool = options.connect(url).await?;

        Self::init_schema(&pool).await?;
        tracing::info!("feedback store ready");
        Ok(Self { pool })
    }

    async fn init_schema(pool: &SqlitePool) -> Result<(), FeedbackError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS image_feedback (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                image_url TEXT NOT NULL,
                query TEXT NOT NULL,
                relevant INTEGER NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, FeedbackError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM image_feedback")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl FeedbackStore for SqliteFeedbackStore {
    async fn record(&self, record: &FeedbackRecord) -> Result<(), FeedbackError> {
        sqlx::query(
            "INSERT INTO image_feedback (image_url, query, relevant, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(record.image_url.as_str())
        .bind(record.query.as_str())
        .bind(record.relevant)
        .bind(record.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await?;
        tracing::debug!(
            "recorded feedback for {} (relevant: {})",
            record.image_url,
            record.relevant
        );
        Ok(())
    }
}
