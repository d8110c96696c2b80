use thiserror::Error;

/// Core error type for lumeris.
/// Internally, modules can use `anyhow::Result<T>` for convenience,
/// but public boundaries should expose `CoreResult<T>` with this error.
#[derive(Debug, Error)]
pub enum LumerisError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not authenticated: {message}")]
    Unauthorized { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("rate limited by backend")]
    RateLimited { retry_after: Option<u64> },

    #[error("backend unavailable")]
    BackendUnavailable,

    #[error("backend error: {code} {message}")]
    BackendError { code: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type CoreResult<T> = std::result::Result<T, LumerisError>;
