use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
}

impl ChatTurn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Ordered question/answer turns of one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHistory {
    turns: Vec<ChatTurn>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&ChatTurn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl From<Vec<ChatTurn>> for ChatHistory {
    fn from(turns: Vec<ChatTurn>) -> Self {
        Self { turns }
    }
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn load(&self, session_id: &Uuid) -> Result<ChatHistory>;
    async fn append(&self, session_id: &Uuid, turn: ChatTurn) -> Result<()>;
    async fn clear(&self, session_id: &Uuid) -> Result<()>;
}

#[derive(Debug)]
struct SessionData {
    history: ChatHistory,
    last_accessed: Instant,
}

/// Process-local history store; sessions idle longer than the TTL are
/// dropped on the next access.
#[derive(Debug)]
pub struct InMemoryHistoryStore {
    sessions: Mutex<HashMap<Uuid, SessionData>>,
    ttl: Duration,
}

impl InMemoryHistoryStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn gc(&self) {
        let now = Instant::now();
        let ttl = self.ttl;
        self.lock()
            .retain(|_, session_data| now.duration_since(session_data.last_accessed) < ttl);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, SessionData>> {
        // A poisoned map still holds consistent turns; keep serving it.
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn load(&self, session_id: &Uuid) -> Result<ChatHistory> {
        self.gc();
        Ok(self
            .lock()
            .get(session_id)
            .map(|data| data.history.clone())
            .unwrap_or_default())
    }

    async fn append(&self, session_id: &Uuid, turn: ChatTurn) -> Result<()> {
        let now = Instant::now();
        let mut sessions = self.lock();

        match sessions.get_mut(session_id) {
            Some(session_data) => {
                session_data.history.push(turn);
                session_data.last_accessed = now;
            }
            None => {
                let mut history = ChatHistory::new();
                history.push(turn);
                sessions.insert(
                    *session_id,
                    SessionData {
                        history,
                        last_accessed: now,
                    },
                );
            }
        }
        Ok(())
    }

    async fn clear(&self, session_id: &Uuid) -> Result<()> {
        self.lock().remove(session_id);
        Ok(())
    }
}
