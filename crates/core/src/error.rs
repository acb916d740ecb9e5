//! Error types for the GreenBible domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type.

use thiserror::Error;

// --- Bounded context errors ---

/// Failures of the language-model gateway.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Model request failed with status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed model payload: {0}")]
    MalformedPayload(String),

    #[error("Gateway not configured: {0}")]
    NotConfigured(String),
}

/// Failures of the key-value and task stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O failed for '{key}': {reason}")]
    Io { key: String, reason: String },

    #[error("Corrupt payload under '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Invalid task: {0}")]
    InvalidTask(String),
}
