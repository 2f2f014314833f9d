use qa::{IngestReport, Language};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vector_store::DocumentSummary;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
    pub default_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    /// Origin URL or file name.
    pub source: String,
    pub text: String,
    pub chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
}

pub type IngestResponse = IngestReport;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsResponse {
    pub documents: Vec<DocumentSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub session_id: Uuid,
    pub question: String,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// `en` or `ja`; detected from the question when absent.
    pub language: Option<String>,
}

impl AskRequest {
    pub fn language(&self) -> akasha_core::Result<Option<Language>> {
        self.language.as_deref().map(str::parse).transpose()
    }
}
