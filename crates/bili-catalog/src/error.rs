use thiserror::Error;

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// No response was obtained from the remote service.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("connection failed: {0}")]
    Connection(String),
}

/// A request was rejected locally, before anything was sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Precondition {
    #[error("missing anti-forgery token (bili_jct)")]
    MissingCsrfToken,
    #[error("search keyword is empty")]
    EmptyKeyword,
    #[error("danmaku message is empty")]
    EmptyMessage,
    #[error("invalid video id: {0}")]
    InvalidVideoId(String),
    #[error("content-stream id (cid) is required")]
    MissingContentId,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("http status {status} from {endpoint}")]
    HttpStatus { status: u16, endpoint: String },
    #[error("failed to decode {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
    #[error("remote error {code}: {message}")]
    Remote { code: i64, message: String },
    #[error("precondition failed: {0}")]
    Precondition(#[from] Precondition),
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl CatalogError {
    pub fn decode(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    pub fn remote(code: i64, message: impl Into<String>) -> Self {
        Self::Remote {
            code,
            message: message.into(),
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether repeating the same request may succeed.
    ///
    /// Only transport failures and server-side HTTP errors qualify. Remote codes
    /// are answers, not outages.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// The platform's status code, for remote failures.
    pub fn remote_code(&self) -> Option<i64> {
        match self {
            Self::Remote { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(TransportError::Http(e))
    }
}

impl From<url::ParseError> for CatalogError {
    fn from(e: url::ParseError) -> Self {
        Self::Configuration(format!("invalid url: {e}"))
    }
}
