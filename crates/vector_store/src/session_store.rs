use akasha_core::{ChatHistory, ChatTurn, Error, HistoryStore, Result};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use std::time::Duration;
use uuid::Uuid;

/// Chat history kept in Redis as one JSON value per session, expiring after
/// `ttl` without activity.
pub struct RedisHistoryStore {
    client: Client,
    ttl: Duration,
}

impl RedisHistoryStore {
    pub async fn connect(redis_url: &str, ttl: Duration) -> Result<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| Error::configuration(format!("Invalid Redis URL: {}", e)))?;

        let store = Self { client, ttl };
        store.connection().await?;
        Ok(store)
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(redis_error("Connect to Redis"))
    }

    fn key(session_id: &Uuid) -> String {
        format!("session:{}", session_id)
    }
}

fn redis_error(operation: &str) -> impl Fn(redis::RedisError) -> Error + '_ {
    move |e| Error::storage(format!("{} failed: {}", operation, e))
}

#[async_trait]
impl HistoryStore for RedisHistoryStore {
    async fn load(&self, session_id: &Uuid) -> Result<ChatHistory> {
        let mut conn = self.connection().await?;
        let data: Option<String> = conn
            .get(Self::key(session_id))
            .await
            .map_err(redis_error("Load session"))?;

        match data {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| Error::storage(format!("Corrupt session data: {}", e))),
            None => Ok(ChatHistory::new()),
        }
    }

    async fn append(&self, session_id: &Uuid, turn: ChatTurn) -> Result<()> {
        let mut history = self.load(session_id).await?;
        history.push(turn);

        let json = serde_json::to_string(&history)
            .map_err(|e| Error::storage(format!("Failed to serialize session: {}", e)))?;

        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(Self::key(session_id), json, self.ttl.as_secs())
            .await
            .map_err(redis_error("Store session"))
    }

    async fn clear(&self, session_id: &Uuid) -> Result<()> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(Self::key(session_id))
            .await
            .map_err(redis_error("Delete session"))
    }
}
