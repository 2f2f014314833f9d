use llm::Completion;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::AddAssign;
use vector_store::SearchResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

impl From<&Completion> for TokenUsage {
    fn from(completion: &Completion) -> Self {
        Self {
            prompt_tokens: completion.prompt_tokens,
            completion_tokens: completion.completion_tokens,
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, other: Self) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
    }
}

/// Stages of one question. Succeeded and Failed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QaState {
    Received,
    Condensed,
    Embedded,
    Retrieved,
    Answered,
    Succeeded,
    Failed,
}

impl fmt::Display for QaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QaState::Received => "RECEIVED",
            QaState::Condensed => "CONDENSED",
            QaState::Embedded => "EMBEDDED",
            QaState::Retrieved => "RETRIEVED",
            QaState::Answered => "ANSWERED",
            QaState::Succeeded => "SUCCEEDED",
            QaState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// A standalone question and what it cost to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condensation {
    pub question: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QaAnswer {
    pub answer: String,
    pub standalone_question: String,
    pub sources: Vec<SearchResult>,
    pub model: String,
    pub usage: TokenUsage,
    /// Every state visited, ending in Succeeded.
    pub states: Vec<QaState>,
}
