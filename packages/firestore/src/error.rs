//! Error types.
//!
//! [`FirebaseError`] is what a dispatched request delivers through its
//! result sink. [`Error`] covers failures while building the engine itself.

/// Codes for errors synthesized by the engine before a request reaches the
/// network.
pub mod code {
    pub const APP_WAS_NOT_ASSIGNED: i32 = -104;
    pub const OPERATION_CANCELLED: i32 = -113;
}

/// Error delivered to the caller for one dispatched request.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FirebaseError {
    /// No app/token binding could be resolved.
    #[error("app was not assigned")]
    AppNotAssigned,

    /// No execution slot could be allocated.
    #[error("operation was cancelled")]
    OperationCancelled,

    /// The transport failed before a response was read.
    #[error("transport error {code}: {message}")]
    Transport { code: i32, message: String },

    /// The service answered with a non-2xx status; `body` is passed through as is.
    #[error("remote error {status}: {body}")]
    Remote { status: u16, body: String },
}

impl FirebaseError {
    pub fn code(&self) -> i32 {
        match self {
            FirebaseError::AppNotAssigned => code::APP_WAS_NOT_ASSIGNED,
            FirebaseError::OperationCancelled => code::OPERATION_CANCELLED,
            FirebaseError::Transport { code, .. } => *code,
            FirebaseError::Remote { status, .. } => i32::from(*status),
        }
    }

    pub fn message(&self) -> String {
        match self {
            FirebaseError::Transport { message, .. } => message.clone(),
            FirebaseError::Remote { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}

impl From<firelink_http::Error> for FirebaseError {
    fn from(error: firelink_http::Error) -> Self {
        match error {
            firelink_http::Error::Transport { code, message } => {
                FirebaseError::Transport { code, message }
            }
            other => FirebaseError::Transport {
                code: other.code(),
                message: other.to_string(),
            },
        }
    }
}

/// Errors raised while configuring the engine.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] firelink_http::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {message}")]
    InvalidConfig { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
