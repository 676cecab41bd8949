//! Tracing configuration for the bridge service.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::Result;

/// Configure stdout logging with an environment-driven filter.
///
/// `RUST_LOG` selects the level; the bridge crates default to debug so that
/// lifecycle transitions and backend invocations are visible out of the box.
pub fn configure_tracing() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,sandbox_bridge=debug".into()),
    );

    let fmt_layer = tracing_subscriber::fmt::layer();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}
