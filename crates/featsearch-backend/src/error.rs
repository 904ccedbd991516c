//! Transport errors for the HTTP backend.
//!
//! These never escape the collaborator boundary: [`crate::FeatureBackend`]
//! methods log them and report "no reply" instead.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("invalid backend url `{0}`")]
    Url(String),
    #[error("failed to build request: {0}")]
    Request(#[from] hyper::http::Error),
    #[error("transport error: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),
    #[error("failed to read response body: {0}")]
    Body(#[from] hyper::Error),
    #[error("backend returned {status} for {path}")]
    Status {
        path: &'static str,
        status: hyper::StatusCode,
    },
    #[error("request to {path} timed out after {timeout:?}")]
    Timeout {
        path: &'static str,
        timeout: Duration,
    },
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}
