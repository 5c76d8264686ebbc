use thiserror::Error;

/// Failure of a single schedule fetch.
///
/// Carried by value through the store and broadcast to subscribers, so every
/// variant holds owned, cloneable data rather than the underlying error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected HTTP status: {0}")]
    UnexpectedStatus(u16),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    /// Whether a later refresh has a reasonable chance of succeeding.
    /// Only used to pick a log level; nothing retries automatically.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::UnexpectedStatus(code) => *code == 429 || (500..600).contains(code),
            Self::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Network(format!("request timed out: {}", err))
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Error: {0}")]
    Anyhow(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Schedule store is no longer running")]
    StoreClosed,
}

impl AppError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn is_pii_safe(&self) -> bool {
        match self {
            Self::Fetch(FetchError::Network(_)) | Self::Anyhow(_) => false,
            Self::Fetch(_)
            | Self::Config(_)
            | Self::InvalidInput(_)
            | Self::NotFound(_)
            | Self::StoreClosed => true,
        }
    }

    pub fn to_safe_string(&self) -> String {
        if self.is_pii_safe() {
            self.to_string()
        } else {
            match self {
                Self::Fetch(_) => "Network request failed".to_string(),
                Self::Anyhow(_) => "Operation failed".to_string(),
                _ => self.to_string(),
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
