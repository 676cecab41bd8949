//! Error types for the sandbox bridge.

use thiserror::Error;

use crate::types::REGISTRATION_TIMEOUT;

/// Result type alias using the bridge's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the sandbox bridge.
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Startup / lifecycle errors (operator-visible only)
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Fabric connection failed: {0}")]
    Connection(String),

    #[error("Service {operation} did not complete within {} seconds", REGISTRATION_TIMEOUT.as_secs())]
    RegistrationTimeout { operation: String },

    #[error("The bridge service is already running")]
    AlreadyRunning,

    // =========================================================================
    // Request-path errors (reported to fabric callers as error responses)
    // =========================================================================
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("{}", backend_failure_text(.message, .code))]
    Backend {
        message: String,
        code: Option<i64>,
    },

    #[error("No executor is bound to topic '{0}'")]
    TopicNotFound(String),

    // =========================================================================
    // Generic errors
    // =========================================================================
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn backend_failure_text(message: &str, code: &Option<i64>) -> String {
    match code {
        Some(code) => format!(
            "Response failed with error code {}. Message: {}",
            code, message
        ),
        None => message.to_string(),
    }
}

impl Error {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a fabric connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a registration timeout error for the named lifecycle operation.
    pub fn registration_timeout(operation: impl Into<String>) -> Self {
        Self::RegistrationTimeout {
            operation: operation.into(),
        }
    }

    /// Create a bad request error.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Create a backend failure error.
    pub fn backend(message: impl Into<String>, code: Option<i64>) -> Self {
        Self::Backend {
            message: message.into(),
            code,
        }
    }

    /// Create a topic-not-found error.
    pub fn topic_not_found(topic: impl Into<String>) -> Self {
        Self::TopicNotFound(topic.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
