/// Transport-level failure codes.
///
/// Negative so they never collide with HTTP status codes.
pub mod code {
    pub const CONNECTION_REFUSED: i32 = -1;
    pub const SEND_FAILED: i32 = -2;
    pub const READ_TIMEOUT: i32 = -3;
    pub const RESPONSE_FAILED: i32 = -4;
    pub const UNKNOWN: i32 = -5;
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Transport error {code}: {message}")]
    Transport { code: i32, message: String },

    #[error("Request {id} is already outstanding")]
    DuplicateRequest { id: u64 },

    #[error("Lock error: {message}")]
    Lock { message: String },
}

impl Error {
    /// Numeric code surfaced to callers alongside the message.
    pub fn code(&self) -> i32 {
        match self {
            Error::Transport { code, .. } => *code,
            Error::Http(e) => reqwest_code(e),
            _ => code::UNKNOWN,
        }
    }
}

pub(crate) fn reqwest_code(error: &reqwest::Error) -> i32 {
    if error.is_timeout() {
        code::READ_TIMEOUT
    } else if error.is_connect() {
        code::CONNECTION_REFUSED
    } else if error.is_request() || error.is_builder() {
        code::SEND_FAILED
    } else if error.is_body() || error.is_decode() {
        code::RESPONSE_FAILED
    } else {
        code::UNKNOWN
    }
}
