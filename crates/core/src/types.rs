//! Shared types for the sandbox bridge.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// The timeout applied to service registration and unregistration.
pub const REGISTRATION_TIMEOUT: Duration = Duration::from_secs(60);

/// The default port used to communicate with a sandbox backend.
pub const DEFAULT_BACKEND_PORT: u16 = 8090;

/// The default thread count for the incoming message pool.
pub const DEFAULT_THREAD_COUNT: usize = 10;

/// The default queue size for the incoming message pool.
pub const DEFAULT_QUEUE_SIZE: usize = 1000;

/// Lifecycle state of the bridge service.
///
/// `Idle` is the initial state. `Running` is reached only from `Idle` via a
/// successful connect and register. `Destroyed` is terminal; no transition
/// ever returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Constructed but not started.
    Idle,
    /// Connected to the fabric with the service registered.
    Running,
    /// Torn down; terminal.
    Destroyed,
}

/// A single sandbox backend endpoint. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendEndpoint {
    /// The configured name of the backend.
    pub name: String,
    /// The backend host.
    pub host: String,
    /// The backend port.
    pub port: u16,
}

impl BackendEndpoint {
    /// Create a new endpoint description.
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
        }
    }

    /// The base URL for command invocations against this backend.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// One inbound request as delivered by the fabric layer.
#[derive(Debug, Clone)]
pub struct CommandRequest {
    /// The raw request payload.
    pub payload: Bytes,
    /// Opaque correlation token supplied by the fabric layer.
    pub correlation_id: String,
}

impl CommandRequest {
    /// Build a request from a payload and correlation token.
    pub fn new(payload: impl Into<Bytes>, correlation_id: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            correlation_id: correlation_id.into(),
        }
    }
}

/// The normalized result of invoking one backend command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The backend reported success; the payload is the result body.
    Success(String),
    /// The backend reported an error, was unreachable, or returned a
    /// malformed response.
    Failure {
        message: String,
        code: Option<i64>,
    },
}

impl CommandOutcome {
    /// Build a success outcome.
    pub fn success(payload: impl Into<String>) -> Self {
        Self::Success(payload.into())
    }

    /// Build a failure outcome.
    pub fn failure(message: impl Into<String>, code: Option<i64>) -> Self {
        Self::Failure {
            message: message.into(),
            code,
        }
    }
}

/// The response delivered back to the requesting fabric client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FabricResponse {
    /// A normal response carrying the raw backend result as its payload.
    Normal { payload: Bytes },
    /// An error response whose message describes the failure.
    Error { message: String },
}

impl FabricResponse {
    /// Build a normal response.
    pub fn normal(payload: impl Into<Bytes>) -> Self {
        Self::Normal {
            payload: payload.into(),
        }
    }

    /// Build an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Whether this is an error response.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Options applied when connecting to the fabric.
///
/// The connection parameters themselves live in the fabric configuration
/// file and are opaque to this crate; only the incoming message pool sizing
/// is surfaced here.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Path to the fabric connection configuration file.
    pub config_path: PathBuf,
    /// Queue depth for the incoming message pool.
    pub queue_size: usize,
    /// Worker thread count for the incoming message pool.
    pub thread_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_derived_from_host_and_port() {
        let endpoint = BackendEndpoint::new("sandbox1", "10.0.0.5", DEFAULT_BACKEND_PORT);
        assert_eq!(endpoint.base_url(), "http://10.0.0.5:8090");
    }

    #[test]
    fn error_response_is_flagged() {
        assert!(FabricResponse::error("boom").is_error());
        assert!(!FabricResponse::normal("ok").is_error());
    }
}
