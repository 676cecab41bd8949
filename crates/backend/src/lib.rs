#![deny(unused)]
//! HTTP executor for sandbox backend commands.
//!
//! One [`HttpCommandExecutor`] owns one backend endpoint and one persistent
//! HTTP session. A command is invoked as a GET against `{base}/{command}`
//! with no query parameters (parameter support is a future extension point
//! for POST-style commands), and the backend's text-protocol response is
//! normalized into a [`CommandOutcome`].
//!
//! The wire protocol is deliberately brittle: the body is split at the first
//! colon into a status token and a result body. A status token containing
//! `Error` carries an integer code after its last space. Anything that does
//! not fit this shape is reported as a malformed-response failure rather
//! than an empty success.

use async_trait::async_trait;
use url::Url;

use sandbox_bridge_core::{BackendEndpoint, CommandInvoker, CommandOutcome, Error, Result};

/// Substring of the status token marking a backend-reported error.
const ERROR_STATUS_MARKER: &str = "Error";

/// Executes remote commands against one sandbox backend over HTTP.
pub struct HttpCommandExecutor {
    endpoint: BackendEndpoint,
    base_url: Url,
    client: reqwest::Client,
}

impl HttpCommandExecutor {
    /// Create an executor for `endpoint` with its own persistent session.
    ///
    /// Certificate name mismatches are tolerated: legacy sandbox backends
    /// routinely serve self-signed certificates whose subject does not match
    /// the configured host, and the upstream protocol treats that as
    /// acceptable rather than fatal.
    pub fn new(endpoint: BackendEndpoint) -> Result<Self> {
        let base_url = Url::parse(&endpoint.base_url()).map_err(|e| {
            Error::configuration(format!(
                "Invalid backend address for '{}': {}",
                endpoint.name, e
            ))
        })?;

        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| Error::internal(format!("Failed to build HTTP client: {}", e)))?;

        tracing::info!(
            backend = %endpoint.name,
            host = %endpoint.host,
            port = endpoint.port,
            "Initialized backend executor"
        );

        Ok(Self {
            endpoint,
            base_url,
            client,
        })
    }

    /// The endpoint this executor targets.
    pub fn endpoint(&self) -> &BackendEndpoint {
        &self.endpoint
    }

    async fn send_request(&self, command: &str) -> std::result::Result<String, reqwest::Error> {
        // No parameters yet; logged for parity with what a POST-style
        // extension would carry.
        tracing::info!(
            backend = %self.endpoint.name,
            command = %command,
            params = "{}",
            "Invoking backend command"
        );

        let url = self
            .base_url
            .join(command)
            .unwrap_or_else(|_| self.base_url.clone());
        let response = self.client.get(url).send().await?;
        response.text().await
    }
}

#[async_trait]
impl CommandInvoker for HttpCommandExecutor {
    fn backend_name(&self) -> &str {
        &self.endpoint.name
    }

    async fn execute(&self, command: &str) -> CommandOutcome {
        let body = match self.send_request(command).await {
            Ok(body) => body,
            Err(e) => {
                // Transport failures are reported, never swallowed.
                return CommandOutcome::failure(format!("Backend request failed: {}", e), None);
            }
        };

        tracing::info!(backend = %self.endpoint.name, body = %body, "Raw backend response");
        parse_response(&body)
    }
}

/// Parse a raw backend response body into an outcome.
///
/// `"OK: result"` yields `Success("result")`; `"... Error 500: msg"` yields
/// `Failure("msg", Some(500))`. A body with no colon, or an error status
/// whose trailing token is not an integer, is a malformed response and
/// yields a `Failure` with no code.
pub fn parse_response(body: &str) -> CommandOutcome {
    let Some((status, result)) = body.split_once(':') else {
        return CommandOutcome::failure(
            "Failed to parse backend response: missing status separator",
            None,
        );
    };
    let result = result.trim();

    if !status.contains(ERROR_STATUS_MARKER) {
        return CommandOutcome::success(result);
    }

    let code_token = status.rsplit(' ').next().unwrap_or(status);
    match code_token.trim().parse::<i64>() {
        Ok(code) => CommandOutcome::failure(result, Some(code)),
        Err(_) => CommandOutcome::failure(
            "Failed to parse backend response: invalid error code in status",
            None,
        ),
    }
}
