use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Dates or output directory rejected before any network call
    #[error("Validation error: {0}")]
    Validation(String),
    /// Token service refused or failed the credential exchange
    #[error("Authentication error: {0}")]
    Authentication(String),
    /// Corrections listing or download failed
    #[error("Fetch error: {0}")]
    Fetch(String),
    /// Configuration file missing, malformed or inconsistent
    #[error("Configuration error: {0}")]
    Config(String),
    /// Network request failed
    #[error("Network error: {0}")]
    Network(String),
    /// Failed to parse a response body
    #[error("Parse error: {0}")]
    Parse(String),
    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    Url(String),
    /// IO operation failed
    #[error("IO error: {0}")]
    Io(String),
}

// Conversion implementations for common errors
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Url(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

// Custom type alias for Results in this application
pub type AppResult<T> = Result<T, AppError>;
