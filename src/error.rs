//! Error types shared by the local cache, the remote client and hydration.
//!
//! None of these cross the manager boundary: managers log them and hand
//! callers a `bool` or an `Option` instead.

use thiserror::Error;

/// Failures raised by the embedded SQLite cache.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection lock poisoned")]
    Poisoned,

    #[error("unknown column {column} for table {table}")]
    UnknownColumn { table: &'static str, column: String },

    #[error("refusing to write identity field {0}")]
    IdentityField(String),

    #[error("nothing to write")]
    Empty,

    #[error("row for table {0} has no identity")]
    MissingIdentity(&'static str),
}

/// Failures raised while talking to the remote store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(String),

    #[error("remote store answered {0}")]
    Status(u16),

    #[error("no matching record")]
    NotFound,

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("request rejected before sending: {0}")]
    Rejected(String),

    #[error("request task dropped before completion")]
    Dropped,
}

impl RemoteError {
    /// Short, stable label used in coordinator events and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RemoteError::Network(_) => "network",
            RemoteError::Status(_) => "status",
            RemoteError::NotFound => "not_found",
            RemoteError::Decode(_) => "decode",
            RemoteError::Rejected(_) => "rejected",
            RemoteError::Dropped => "dropped",
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => RemoteError::Status(status.as_u16()),
            None if err.is_decode() => RemoteError::Decode(err.to_string()),
            None => RemoteError::Network(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        RemoteError::Decode(err.to_string())
    }
}

/// A field could not be read from a row, a JSON object or a field map.
#[derive(Debug, Error)]
pub enum HydrationError {
    #[error("missing field {0}")]
    Missing(String),

    #[error("field {field} is not {expected}")]
    Mistyped {
        field: String,
        expected: &'static str,
    },

    #[error("source is not an object")]
    NotAnObject,

    #[error(transparent)]
    Row(#[from] rusqlite::Error),
}
