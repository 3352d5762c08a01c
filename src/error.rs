//! Error types for the Rasad client

/// Errors returned by the API client and the session layer
#[derive(Debug, thiserror::Error)]
pub enum RasadError {
    #[error("Session expired, please log in again")]
    Unauthorized,

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("API error ({status}): {detail}")]
    Api { status: u16, detail: String },

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),
}

impl RasadError {
    /// True when the backend rejected our credentials and the user must log in again.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, RasadError::Unauthorized | RasadError::NotAuthenticated)
    }
}

/// Result type alias for Rasad operations
pub type Result<T> = std::result::Result<T, RasadError>;

/// Walks an `anyhow` chain looking for a 401, so fetchers can return
/// `anyhow::Result` while the app still reacts to an expired session.
pub fn is_session_error(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<RasadError>())
        .any(RasadError::is_unauthorized)
}
