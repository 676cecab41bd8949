//! The request handler boundary.
//!
//! One [`BridgeRequestHandler`] serves every topic the service registers.
//! It parses the inbound payload, resolves the executor for the delivery
//! topic, invokes the backend command, and converts the outcome into a
//! fabric response. Nothing escapes this boundary: failures become error
//! responses, and even a panicking executor is caught and reported rather
//! than allowed to kill the fabric's dispatch thread.

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use sandbox_bridge_core::{
    CommandOutcome, CommandRequest, Error, FabricResponse, RequestHandler, Result,
};

use crate::registry::TopicRegistry;

/// The payload key naming the backend command to invoke.
pub const COMMAND_KEY: &str = "command";

/// Routes inbound fabric requests to backend command executors.
pub struct BridgeRequestHandler {
    registry: Arc<TopicRegistry>,
}

impl BridgeRequestHandler {
    /// Create a handler over a frozen registry.
    pub fn new(registry: Arc<TopicRegistry>) -> Self {
        Self { registry }
    }

    async fn process(&self, topic: &str, request: &CommandRequest) -> Result<String> {
        let document: Value = serde_json::from_slice(&request.payload)
            .map_err(|e| Error::bad_request(format!("Request payload is not valid JSON: {}", e)))?;

        let command = document
            .get(COMMAND_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::bad_request(format!("A command name was not specified ('{}')", COMMAND_KEY))
            })?;

        // Resolution is keyed by the delivery topic, not anything in the
        // payload.
        let invoker = self.registry.lookup(topic)?;

        match invoker.execute(command).await {
            CommandOutcome::Success(payload) => Ok(payload),
            CommandOutcome::Failure { message, code } => Err(Error::backend(message, code)),
        }
    }
}

#[async_trait]
impl RequestHandler for BridgeRequestHandler {
    async fn handle(&self, topic: &str, request: CommandRequest) -> FabricResponse {
        let correlation_id = request.correlation_id.clone();

        match AssertUnwindSafe(self.process(topic, &request))
            .catch_unwind()
            .await
        {
            Ok(Ok(payload)) => FabricResponse::normal(payload),
            Ok(Err(err)) => {
                match &err {
                    Error::BadRequest(_) => tracing::warn!(
                        topic = %topic,
                        correlation_id = %correlation_id,
                        error = %err,
                        "Rejecting malformed request"
                    ),
                    Error::Backend { code, .. } => tracing::warn!(
                        topic = %topic,
                        correlation_id = %correlation_id,
                        code = ?code,
                        error = %err,
                        "Backend command failed"
                    ),
                    _ => tracing::error!(
                        topic = %topic,
                        correlation_id = %correlation_id,
                        error = %err,
                        "Error while processing request"
                    ),
                }
                FabricResponse::error(err.to_string())
            }
            Err(panic) => {
                tracing::error!(
                    topic = %topic,
                    correlation_id = %correlation_id,
                    detail = %panic_message(&panic),
                    "Panic while processing request"
                );
                FabricResponse::error("Unexpected error while processing request")
            }
        }
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
