pub mod config;
pub mod error;
pub mod history;
pub mod retry;

pub use config::Config;
pub use error::{Error, Result};
pub use history::{ChatHistory, ChatTurn, HistoryStore, InMemoryHistoryStore};
pub use retry::RetryPolicy;
