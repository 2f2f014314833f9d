use akasha_core::Error;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use log::{error, warn};
use qa::{QaError, QaState};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

/// Error returned by every handler. Serialized as
/// `{"error": ..., "retryable": ...}` plus the failed stage for questions.
#[derive(ThisError, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] Error),

    #[error(transparent)]
    Question(#[from] QaError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<QaState>,
}

impl ApiError {
    fn cause(&self) -> &Error {
        match self {
            ApiError::Service(e) => e,
            ApiError::Question(e) => &e.source,
        }
    }

    pub fn http_status_code(&self) -> u16 {
        self.cause().http_status_code()
    }

    pub fn is_retryable(&self) -> bool {
        self.cause().is_retryable()
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            retryable: self.is_retryable(),
            state: match self {
                ApiError::Question(e) => Some(e.reached),
                ApiError::Service(_) => None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!("Request failed with {}: {}", status, self);
        } else {
            warn!("Request rejected with {}: {}", status, self);
        }
        (status, Json(self.body())).into_response()
    }
}
