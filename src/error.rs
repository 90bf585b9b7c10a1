use thiserror::Error;

/// Errors surfaced by the HTTP wrapper and the API gateways.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network or connection failure
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Rejected credentials, token or OTP (401/403)
    #[error("not authorized: {detail}")]
    Unauthorized { detail: String },

    /// Any other non-success status
    #[error("server returned {status}: {detail}")]
    Status { status: u16, detail: String },

    /// Response body did not match the expected shape
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request was superseded before it completed
    #[error("request canceled")]
    Canceled,
}

impl ApiError {
    pub fn is_canceled(&self) -> bool {
        matches!(self, ApiError::Canceled)
    }

    /// Short message suitable for showing next to a form.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized { detail } | ApiError::Status { detail, .. } => detail.clone(),
            ApiError::Transport(_) => "Could not reach the server".to_string(),
            ApiError::Decode(_) => "Unexpected response from the server".to_string(),
            ApiError::Canceled => "Request canceled".to_string(),
        }
    }
}

/// Errors from the key/value storage capability.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Errors from submitting the task creation form.
#[derive(Error, Debug)]
pub enum FormError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error(transparent)]
    Api(#[from] ApiError),
}
