use crate::errors::ApiError;
use crate::models::{
    AskRequest, DocumentsResponse, IngestRequest, IngestResponse, ModelsResponse,
};
use crate::state::AppState;
use akasha_core::Error;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use log::info;
use qa::QaAnswer;
use serde_json::{json, Value};
use uuid::Uuid;
use vector_store::Document;

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/models", get(list_models))
        .route("/documents", post(ingest_document).get(list_documents))
        .route("/documents/:id", delete(delete_document))
        .route("/ask", post(ask))
        .route("/sessions/:id", delete(end_session))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.models.to_vec(),
        default_model: state.qa_defaults.model.clone(),
        temperature: state.qa_defaults.temperature,
        max_tokens: state.qa_defaults.max_tokens,
        chunk_size: state.chunk_defaults.chunk_size,
        chunk_overlap: state.chunk_defaults.chunk_overlap,
    })
}

async fn ingest_document(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
    let settings = state
        .chunk_defaults
        .overridden(request.chunk_size, request.chunk_overlap);
    let document = Document::new(request.source, request.text);

    let report = state.ingestor.ingest(&document, &settings).await?;
    info!(
        "Stored document {} from {} ({} chunks)",
        report.document_id, report.source, report.chunks
    );
    Ok((StatusCode::CREATED, Json(report)))
}

async fn list_documents(
    State(state): State<AppState>,
) -> Result<Json<DocumentsResponse>, ApiError> {
    let documents = state.store.list_documents().await?;
    Ok(Json(DocumentsResponse { documents }))
}

async fn delete_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(&document_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<QaAnswer>, ApiError> {
    let mut settings = state.qa_defaults.clone();
    if let Some(model) = &request.model {
        settings = settings.with_model(model);
    }
    if let Some(temperature) = request.temperature {
        settings = settings.with_temperature(temperature);
    }
    if let Some(max_tokens) = request.max_tokens {
        settings = settings.with_max_tokens(max_tokens);
    }
    if let Some(language) = request.language()? {
        settings = settings.with_language(language);
    }
    if !state.models.contains(&settings.model) {
        return Err(Error::configuration(format!(
            "Model '{}' is not available; choose one of: {}",
            settings.model,
            state.models.join(", ")
        ))
        .into());
    }

    let answer = state
        .qa
        .ask(&request.session_id, &request.question, &settings)
        .await?;
    Ok(Json(answer))
}

async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.history.clear(&session_id).await?;
    info!("Ended session {}", session_id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Components;
    use akasha_core::config::{
        ChunkingConfig, EmbeddingConfig, LlmConfig, RetrievalConfig, ServerConfig,
        VectorStoreConfig,
    };
    use akasha_core::{Config, HistoryStore, InMemoryHistoryStore, Result};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use embeddings::HashingEmbeddingProvider;
    use llm::{Completion, CompletionProvider, CompletionRequest};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tower::ServiceExt;
    use vector_store::{InMemoryStatsRecorder, InMemoryVectorStore};

    const DIMENSIONS: usize = 256;

    struct ScriptedCompletion {
        replies: Mutex<VecDeque<String>>,
    }

    impl ScriptedCompletion {
        fn new(replies: Vec<&str>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().map(String::from).collect()),
            }
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedCompletion {
        async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
            let text = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| "I don't know.".to_string());
            Ok(Completion {
                text,
                model: request.model.clone(),
                prompt_tokens: 10,
                completion_tokens: 5,
            })
        }
    }

    fn test_config() -> Config {
        Config {
            embedding: EmbeddingConfig {
                provider: "hashing".to_string(),
                model: None,
                base_url: None,
                dimensions: Some(DIMENSIONS),
                api_key: None,
                batch_size: 16,
                concurrency: 4,
                timeout_secs: 5,
                max_retries: 0,
            },
            llm: LlmConfig {
                default_model: "gpt-3.5-turbo".to_string(),
                models: vec!["gpt-3.5-turbo".to_string(), "gpt-4".to_string()],
                openai_base_url: None,
                anthropic_base_url: None,
                aws_region: None,
                openai_api_key: None,
                anthropic_api_key: None,
                temperature: 0.1,
                max_tokens: 1024,
                timeout_secs: 5,
                max_retries: 0,
            },
            vector_store: VectorStoreConfig {
                url: "memory://".to_string(),
                dimensions: DIMENSIONS,
            },
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig {
                threshold: 0.0,
                ..RetrievalConfig::default()
            },
            server: ServerConfig::default(),
            redis: None,
            data: None,
        }
    }

    fn test_state(replies: Vec<&str>) -> (AppState, Arc<InMemoryHistoryStore>) {
        let config = test_config();
        let history = Arc::new(InMemoryHistoryStore::new(Duration::from_secs(60)));
        let state = AppState::new(
            Components {
                completion: Arc::new(ScriptedCompletion::new(replies)),
                models: config.llm.models.clone(),
                embedder: Arc::new(HashingEmbeddingProvider::new(DIMENSIONS)),
                store: Arc::new(InMemoryVectorStore::new(DIMENSIONS)),
                stats: Arc::new(InMemoryStatsRecorder::new()),
                history: history.clone(),
            },
            &config,
        );
        (state, history)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn ingest_fox(app: &Router) -> Value {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/documents",
                json!({
                    "source": "fox.txt",
                    "text": "The quick brown fox jumped over the lazy dog."
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }

    #[tokio::test]
    async fn should_return_ok_for_health_endpoint() {
        let (state, _) = test_state(vec![]);
        let response = create_app(state)
            .oneshot(empty_request("GET", "/health"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn should_return_404_for_unknown_endpoint() {
        let (state, _) = test_state(vec![]);
        let response = create_app(state)
            .oneshot(empty_request("GET", "/unknown"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_list_models_and_defaults() {
        let (state, _) = test_state(vec![]);
        let response = create_app(state)
            .oneshot(empty_request("GET", "/models"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["models"], json!(["gpt-3.5-turbo", "gpt-4"]));
        assert_eq!(json["default_model"], "gpt-3.5-turbo");
        assert_eq!(json["max_tokens"], 1024);
        assert_eq!(json["chunk_size"], 500);
        assert_eq!(json["chunk_overlap"], 0);
    }

    #[tokio::test]
    async fn should_ingest_and_list_documents() {
        let (state, _) = test_state(vec![]);
        let app = create_app(state);

        let report = ingest_fox(&app).await;
        assert_eq!(report["source"], "fox.txt");
        assert_eq!(report["chunks"], 1);

        let response = app
            .oneshot(empty_request("GET", "/documents"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let documents = json["documents"].as_array().unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0]["document_id"], report["document_id"]);
        assert_eq!(documents[0]["chunk_count"], 1);
    }

    #[tokio::test]
    async fn should_reject_out_of_range_chunk_size() {
        let (state, _) = test_state(vec![]);
        let response = create_app(state)
            .oneshot(json_request(
                "POST",
                "/documents",
                json!({"source": "fox.txt", "text": "The fox.", "chunk_size": 50}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["retryable"], false);
        assert!(json.get("state").is_none());
    }

    #[tokio::test]
    async fn should_delete_documents_idempotently() {
        let (state, _) = test_state(vec![]);
        let app = create_app(state);
        let report = ingest_fox(&app).await;
        let uri = format!("/documents/{}", report["document_id"].as_str().unwrap());

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(empty_request("DELETE", &uri))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NO_CONTENT);
        }

        let response = app
            .oneshot(empty_request("GET", "/documents"))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["documents"], json!([]));
    }

    #[tokio::test]
    async fn should_answer_question_with_sources() {
        let (state, history) = test_state(vec!["The fox jumped over the dog."]);
        let app = create_app(state);
        ingest_fox(&app).await;
        let session_id = Uuid::new_v4();

        let response = app
            .oneshot(json_request(
                "POST",
                "/ask",
                json!({"session_id": session_id, "question": "What did the fox do?"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["answer"], "The fox jumped over the dog.");
        assert_eq!(json["standalone_question"], "What did the fox do?");
        assert_eq!(json["sources"].as_array().unwrap().len(), 1);
        assert_eq!(json["usage"]["prompt_tokens"], 10);
        assert_eq!(json["states"].as_array().unwrap().last().unwrap(), "SUCCEEDED");

        let turns = history.load(&session_id).await.unwrap();
        assert_eq!(turns.len(), 1);
    }

    #[tokio::test]
    async fn should_reject_unknown_model_before_asking() {
        let (state, history) = test_state(vec![]);
        let session_id = Uuid::new_v4();

        let response = create_app(state)
            .oneshot(json_request(
                "POST",
                "/ask",
                json!({
                    "session_id": session_id,
                    "question": "What did the fox do?",
                    "model": "llama-2"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(history.load(&session_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_report_failed_state_for_invalid_generation_settings() {
        let (state, _) = test_state(vec![]);

        let response = create_app(state)
            .oneshot(json_request(
                "POST",
                "/ask",
                json!({
                    "session_id": Uuid::new_v4(),
                    "question": "What did the fox do?",
                    "temperature": 1.5
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["state"], "RECEIVED");
        assert_eq!(json["retryable"], false);
    }

    #[tokio::test]
    async fn should_reject_unsupported_language() {
        let (state, _) = test_state(vec![]);

        let response = create_app(state)
            .oneshot(json_request(
                "POST",
                "/ask",
                json!({
                    "session_id": Uuid::new_v4(),
                    "question": "What did the fox do?",
                    "language": "klingon"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_discard_history_when_session_ends() {
        let (state, history) = test_state(vec!["It jumped."]);
        let app = create_app(state);
        ingest_fox(&app).await;
        let session_id = Uuid::new_v4();

        app.clone()
            .oneshot(json_request(
                "POST",
                "/ask",
                json!({"session_id": session_id, "question": "What did the fox do?"}),
            ))
            .await
            .unwrap();
        assert_eq!(history.load(&session_id).await.unwrap().len(), 1);

        let response = app
            .oneshot(empty_request("DELETE", &format!("/sessions/{}", session_id)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(history.load(&session_id).await.unwrap().is_empty());
    }
}
