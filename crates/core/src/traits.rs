//! Trait seams for the sandbox bridge.
//!
//! These traits define the contracts between the lifecycle controller, the
//! fabric transport, and the per-topic command executors. The fabric
//! transport itself is an external collaborator; everything that touches it
//! goes through `FabricClient`/`FabricConnection` so that tests can swap in
//! the mocks from [`crate::mocks`].

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::types::{CommandOutcome, CommandRequest, ConnectOptions, FabricResponse};

// =============================================================================
// Request handling
// =============================================================================

/// Handler invoked by the fabric delivery layer for each inbound request.
///
/// Implementations must be safe to invoke concurrently from any of the
/// fabric's worker threads, and must never fail: every failure mode is
/// converted into an error [`FabricResponse`] at this boundary so that
/// nothing escapes into the fabric's dispatch machinery.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Handle one request delivered on `topic` and produce the response.
    async fn handle(&self, topic: &str, request: CommandRequest) -> FabricResponse;
}

// =============================================================================
// Backend command invocation
// =============================================================================

/// Executes one named command against one backend endpoint.
///
/// Implementations are stateless per call and hold no shared mutable state,
/// so a single invoker may serve concurrent requests.
#[async_trait]
pub trait CommandInvoker: Send + Sync {
    /// The configured name of the backend this invoker targets.
    fn backend_name(&self) -> &str;

    /// Invoke `command` and normalize the response into an outcome.
    ///
    /// Transport failures surface as `Failure` outcomes; this call does not
    /// error.
    async fn execute(&self, command: &str) -> CommandOutcome;
}

impl std::fmt::Debug for dyn CommandInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandInvoker")
            .field("backend_name", &self.backend_name())
            .finish()
    }
}

// =============================================================================
// Fabric transport
// =============================================================================

/// The topic set and handler registered with the fabric for one service.
pub struct ServiceRegistration {
    /// The service type identifier registered with the fabric.
    pub service_type: String,
    /// The request topics the service listens on.
    pub topics: Vec<String>,
    /// The handler the fabric dispatches inbound requests to.
    pub handler: Arc<dyn RequestHandler>,
}

/// An established fabric connection.
#[async_trait]
pub trait FabricConnection: Send + Sync {
    /// Register a service's topic set, completing once the fabric has
    /// acknowledged the registration.
    async fn register_service(&self, registration: ServiceRegistration) -> Result<()>;

    /// Unregister a previously registered service, completing once the
    /// fabric has acknowledged the unregistration.
    async fn unregister_service(&self, service_type: &str) -> Result<()>;

    /// Close the connection and release its resources.
    async fn disconnect(&self) -> Result<()>;
}

/// Entry point into the fabric transport.
#[async_trait]
pub trait FabricClient: Send + Sync {
    /// Establish a connection to the fabric.
    async fn connect(&self, options: &ConnectOptions) -> Result<Arc<dyn FabricConnection>>;
}
