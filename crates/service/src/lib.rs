#![deny(unused)]
//! Service lifecycle and request routing for the sandbox bridge.
//!
//! This crate owns the bridge's state machine: it loads configuration into
//! a frozen topic registry, connects and registers with the fabric, routes
//! inbound requests to backend command executors, and tears everything down
//! again. See [`controller::ServiceLifecycleController`] for the lifecycle
//! contract.

pub mod controller;
pub mod handler;
pub mod registry;

pub use controller::ServiceLifecycleController;
pub use handler::BridgeRequestHandler;
pub use registry::{TopicRegistry, TopicRegistryBuilder};

/// The service type registered with the fabric; doubles as the request topic.
pub const SERVICE_TYPE: &str = "/service/sandbox/remote";
