//! Error types for docpile.

use thiserror::Error;

/// Result type alias using DispatchError.
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Main error type for the task dispatch pipeline.
///
/// The variants follow the caller-facing taxonomy: configuration mistakes
/// and bad inputs are the caller's problem (HTTP 400), a non-200 from the
/// model service is surfaced as a structured failure result, and an
/// integrity violation aborts the request (HTTP 500).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Unsupported model kind, unrecognized task, unknown dataset, or a
    /// missing required task-setting key.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Zero documents where at least one is required, or malformed task
    /// settings (e.g. non-numeric `top_n`).
    #[error("Invalid input: {0}")]
    Input(String),

    /// Non-200 status from the model service. Never retried; the raw
    /// payload is passed back to the caller as-is.
    #[error("Remote service error: status {status}")]
    Remote {
        status: u16,
        body: serde_json::Value,
    },

    /// Embedding response order/index mismatch with the request order.
    /// A broken invariant, not a user input problem.
    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corpus error: {0}")]
    Corpus(String),
}
