use firelink_firestore::FirebaseError;

/// Errors reported by the command-line tool.
#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("no access token; pass --token or set FIRELINK_TOKEN")]
    MissingToken,

    #[error("invalid JSON '{input}': {source}")]
    InvalidJson {
        input: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{message}")]
    InvalidArgument { message: String },

    #[error("cannot read config {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Engine(#[from] firelink_firestore::Error),

    #[error(transparent)]
    Http(#[from] firelink_http::Error),

    #[error("request failed ({}): {}", .0.code(), .0.message())]
    Request(FirebaseError),
}
