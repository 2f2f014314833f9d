use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Provider error: {message}")]
    Provider { message: String, retryable: bool },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    /// A transient provider failure (network, timeout, rate limit, 5xx).
    pub fn provider(message: impl Into<String>) -> Self {
        Error::Provider {
            message: message.into(),
            retryable: true,
        }
    }

    /// A provider answered, but with something we cannot use.
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::Provider {
            message: message.into(),
            retryable: false,
        }
    }

    /// Classifies a non-success HTTP answer from an upstream API.
    /// 408, 429 and 5xx are worth retrying; other statuses are not.
    pub fn from_http_status(provider: &str, status: u16, body: &str) -> Self {
        let message = format!("{} API returned error {}: {}", provider, status, body);
        if status == 408 || status == 429 || status >= 500 {
            Self::provider(message)
        } else {
            Self::malformed(message)
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Error::Storage(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound(message.into())
    }

    /// Returns the appropriate HTTP status code for this error
    pub fn http_status_code(&self) -> u16 {
        match self {
            Error::Configuration(_) => 400, // Bad Request
            Error::Provider { .. } => 502,  // Bad Gateway (upstream model failed)
            Error::Storage(_) => 503,       // Service Unavailable (can retry)
            Error::NotFound(_) => 404,
        }
    }

    /// Returns true if the error is potentially recoverable with a retry
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Configuration(_) => false,
            Error::Provider { retryable, .. } => *retryable,
            Error::Storage(_) => true,
            Error::NotFound(_) => false,
        }
    }
}
