use crate::models::UsageRecord;
use crate::pgvector::sql_error;
use akasha_core::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Mutex;
use tracing::debug;

/// Append-only sink for per-question token usage.
#[async_trait]
pub trait StatsRecorder: Send + Sync {
    async fn record(&self, usage: UsageRecord) -> Result<()>;
}

pub struct PgStatsRecorder {
    pool: PgPool,
}

impl PgStatsRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatsRecorder for PgStatsRecorder {
    async fn record(&self, usage: UsageRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO usage_stats (model, prompt_tokens, completion_tokens, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&usage.model)
        .bind(usage.prompt_tokens as i32)
        .bind(usage.completion_tokens as i32)
        .bind(usage.created_at)
        .execute(&self.pool)
        .await
        .map_err(sql_error("Record usage"))?;

        debug!(
            "Recorded usage for {}: {} prompt + {} completion tokens",
            usage.model, usage.prompt_tokens, usage.completion_tokens
        );
        Ok(())
    }
}

/// Keeps usage records in memory; pairs with the in-memory vector store.
#[derive(Debug, Default)]
pub struct InMemoryStatsRecorder {
    records: Mutex<Vec<UsageRecord>>,
}

impl InMemoryStatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<UsageRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl StatsRecorder for InMemoryStatsRecorder {
    async fn record(&self, usage: UsageRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(usage);
        Ok(())
    }
}
