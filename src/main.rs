#![deny(unused)]
//! Sandbox bridge service binary.
//!
//! Exposes a remote sandbox analysis server's commands to a pub/sub
//! messaging fabric: requests received on the service topic are invoked
//! against the sandbox backend over HTTP and the normalized result is
//! delivered back as a fabric response.

use std::path::PathBuf;
use std::sync::Arc;

use sandbox_bridge_core::FabricClient;
use sandbox_bridge_fabric::InProcessFabric;
use sandbox_bridge_service::ServiceLifecycleController;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sandbox_bridge_core::configure_tracing()?;

    tracing::info!("Starting sandbox-bridge v{}", env!("CARGO_PKG_VERSION"));

    // Config directory: first argument, then BRIDGE_CONFIG_DIR, then ./config.
    let config_dir = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("BRIDGE_CONFIG_DIR").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config"));
    tracing::info!(config_dir = %config_dir.display(), "Using configuration directory");

    // The in-process fabric backs local operation; a networked fabric
    // transport plugs in through the same FabricClient seam.
    let fabric: Arc<dyn FabricClient> = Arc::new(InProcessFabric::new());
    let controller = Arc::new(ServiceLifecycleController::new(config_dir, fabric));

    controller.run().await?;
    tracing::info!(
        topic = sandbox_bridge_service::SERVICE_TYPE,
        "Service is running; press Ctrl-C to stop"
    );

    // Destroy on every exit path once running, signal error included.
    let signal = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown requested");

    controller.destroy().await?;
    tracing::info!("Service destroyed.");
    signal?;
    Ok(())
}
