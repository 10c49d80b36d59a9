use thiserror::Error;

#[derive(Error, Debug)]
pub enum WarpError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{operation} rejected by the WARP API (status {status}): {body}")]
    Api {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("Unexpected response to {operation}: {reason}")]
    InvalidResponse {
        operation: &'static str,
        reason: String,
    },
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid settings file {path}: {reason}")]
    Settings { path: String, reason: String },
    #[error("Could not determine the home directory")]
    HomeDirUnavailable,
}

pub type Result<T> = std::result::Result<T, WarpError>;
