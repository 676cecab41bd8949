#![deny(unused)]
//! Core types, traits, and error definitions for the sandbox bridge.
//!
//! This crate provides the foundational building blocks shared across the
//! bridge service: the error taxonomy, the fabric trait seams, configuration
//! loading, and mock implementations for testing.

pub mod config;
pub mod error;
pub mod mocks;
pub mod tracing_layer;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use tracing_layer::configure_tracing;
pub use traits::*;
pub use types::*;
