use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScouterError {
    #[error("GitHub API error: {0}")]
    ApiError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ScouterError {
    /// Statuses the platform uses for "you may not see this right now".
    /// Collectors log these at warn level and fall back to their default.
    pub fn is_soft_failure(&self) -> bool {
        matches!(
            self,
            ScouterError::Forbidden(_)
                | ScouterError::RateLimitExceeded(_)
                | ScouterError::NotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ScouterError>;
