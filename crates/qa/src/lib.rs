pub mod condenser;
pub mod ingest;
pub mod models;
pub mod prompts;
pub mod retrieval;
pub mod settings;

#[cfg(test)]
mod testing;

pub use condenser::QuestionCondenser;
pub use ingest::{IngestReport, Ingestor};
pub use models::{Condensation, QaAnswer, QaState, TokenUsage};
pub use prompts::{Language, PromptSet};
pub use retrieval::{QaError, RetrievalQa};
pub use settings::{ChunkSettings, QaSettings};
