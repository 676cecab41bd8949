//! Service lifecycle controller.
//!
//! Owns the `Idle -> Running -> Destroyed` state machine, the fabric
//! connection handle, and the frozen topic registry. One exclusive lock
//! serializes `run()` and `destroy()` end to end, including the blocking
//! registration waits, so concurrent lifecycle calls cannot race into a
//! double-register or a half-torn-down service.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::timeout;

use sandbox_bridge_backend::HttpCommandExecutor;
use sandbox_bridge_core::config::BridgeConfig;
use sandbox_bridge_core::{
    Error, FabricClient, FabricConnection, Result, ServiceRegistration, ServiceState,
    REGISTRATION_TIMEOUT,
};

use crate::handler::BridgeRequestHandler;
use crate::registry::TopicRegistry;
use crate::SERVICE_TYPE;

struct ControllerInner {
    state: ServiceState,
    connection: Option<Arc<dyn FabricConnection>>,
    registered: bool,
}

/// Controls the bridge service's connect/register/unregister/disconnect
/// lifecycle against the fabric.
///
/// At most one fabric connection and one service registration exist per
/// controller instance at any time. `run()` is permitted again after a
/// failed attempt; once destroyed, the controller is spent.
pub struct ServiceLifecycleController {
    config_dir: PathBuf,
    fabric: Arc<dyn FabricClient>,
    inner: Mutex<ControllerInner>,
}

impl ServiceLifecycleController {
    /// Create a controller reading its configuration from `config_dir` and
    /// connecting through `fabric`.
    pub fn new(config_dir: impl Into<PathBuf>, fabric: Arc<dyn FabricClient>) -> Self {
        Self {
            config_dir: config_dir.into(),
            fabric,
            inner: Mutex::new(ControllerInner {
                state: ServiceState::Idle,
                connection: None,
                registered: false,
            }),
        }
    }

    /// The current lifecycle state.
    pub async fn state(&self) -> ServiceState {
        self.inner.lock().await.state
    }

    /// Start the service: load configuration, build the topic registry,
    /// connect to the fabric, and register the topic set.
    ///
    /// Blocks under the lifecycle lock until registration is acknowledged
    /// or the fixed timeout elapses; the timeout is fatal for this call and
    /// not retried. On any failure after the connection is established the
    /// connection is torn down before the error propagates, and the
    /// controller remains `Idle` so a later `run()` may retry.
    pub async fn run(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        match inner.state {
            ServiceState::Idle => {}
            ServiceState::Running => return Err(Error::AlreadyRunning),
            ServiceState::Destroyed => {
                return Err(Error::internal("The bridge service has been destroyed"))
            }
        }

        tracing::info!("Running service ...");
        let config = BridgeConfig::load(&self.config_dir)?;
        let registry = Arc::new(build_registry(&config)?);
        let handler = Arc::new(BridgeRequestHandler::new(registry.clone()));

        let options = config.connect_options(&self.config_dir);
        tracing::info!(
            queue_size = options.queue_size,
            thread_count = options.thread_count,
            "Incoming message pool configuration"
        );

        tracing::info!("Attempting to connect to fabric ...");
        let connection = self.fabric.connect(&options).await?;
        tracing::info!("Connected to fabric.");

        let registration = ServiceRegistration {
            service_type: SERVICE_TYPE.to_string(),
            topics: registry.topics(),
            handler,
        };

        tracing::info!("Registering service ...");
        match timeout(REGISTRATION_TIMEOUT, connection.register_service(registration)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                close_connection(&connection).await;
                return Err(e);
            }
            Err(_) => {
                // A timed-out start must not leak the connection.
                close_connection(&connection).await;
                return Err(Error::registration_timeout("registration"));
            }
        }
        tracing::info!("Service registration succeeded.");

        inner.connection = Some(connection);
        inner.registered = true;
        inner.state = ServiceState::Running;
        Ok(())
    }

    /// Stop the service: unregister from the fabric, then disconnect.
    ///
    /// Idempotent; a second call is a no-op. Teardown errors (including an
    /// unregistration timeout) are logged and do not stop the remaining
    /// steps, and the controller always ends `Destroyed` so resources are
    /// never orphaned behind a half-destroyed instance.
    pub async fn destroy(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        match inner.state {
            ServiceState::Destroyed => return Ok(()),
            ServiceState::Idle => {
                inner.state = ServiceState::Destroyed;
                return Ok(());
            }
            ServiceState::Running => {}
        }

        tracing::info!("Destroying service ...");
        if let Some(connection) = inner.connection.take() {
            if inner.registered {
                tracing::info!("Unregistering service ...");
                match timeout(
                    REGISTRATION_TIMEOUT,
                    connection.unregister_service(SERVICE_TYPE),
                )
                .await
                {
                    Ok(Ok(())) => tracing::info!("Service unregistration succeeded."),
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, "Service unregistration failed")
                    }
                    Err(_) => tracing::warn!(
                        "Service unregistration timed out; proceeding with disconnect"
                    ),
                }
                inner.registered = false;
            }
            close_connection(&connection).await;
        }
        inner.state = ServiceState::Destroyed;
        Ok(())
    }
}

impl Drop for ServiceLifecycleController {
    fn drop(&mut self) {
        if let Ok(inner) = self.inner.try_lock() {
            if inner.state == ServiceState::Running {
                tracing::warn!(
                    "Lifecycle controller dropped while running; destroy() was never called"
                );
            }
        }
    }
}

/// Build the frozen topic registry from the loaded configuration.
///
/// The active backend is bound to the service topic; every topic handed to
/// the fabric at registration time comes from this registry, so the set the
/// fabric dispatches on and the set the handler can resolve are identical.
fn build_registry(config: &BridgeConfig) -> Result<TopicRegistry> {
    let endpoint = config.active_backend()?;
    let executor = Arc::new(HttpCommandExecutor::new(endpoint)?);
    Ok(TopicRegistry::builder()
        .bind(SERVICE_TYPE, executor)?
        .build())
}

async fn close_connection(connection: &Arc<dyn FabricConnection>) {
    if let Err(e) = connection.disconnect().await {
        tracing::warn!(error = %e, "Failed to close fabric connection");
    }
}
