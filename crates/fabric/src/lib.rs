#![deny(unused)]
//! In-process fabric transport.
//!
//! A loopback implementation of the fabric trait seams: topics registered
//! through a connection are dispatched directly to their handlers in this
//! process. It backs local operation and end-to-end tests; a networked
//! fabric transport plugs in through the same [`FabricClient`] trait.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use sandbox_bridge_core::{
    CommandRequest, ConnectOptions, FabricClient, FabricConnection, FabricResponse,
    RequestHandler, Result, ServiceRegistration,
};

#[derive(Default)]
struct FabricState {
    /// Dispatch table: topic to registered handler.
    handlers: DashMap<String, Arc<dyn RequestHandler>>,
    /// Topic sets by registered service type.
    services: DashMap<String, Vec<String>>,
}

/// An in-process pub/sub fabric.
///
/// Cloning is cheap; clones share the same dispatch table.
#[derive(Clone, Default)]
pub struct InProcessFabric {
    state: Arc<FabricState>,
}

impl InProcessFabric {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one request on `topic` and await its response.
    ///
    /// This is the caller-side primitive: a correlation id is minted per
    /// request, exactly as a networked fabric layer would attach one.
    pub async fn request(&self, topic: &str, payload: impl Into<Bytes>) -> FabricResponse {
        let Some(handler) = self.state.handlers.get(topic).map(|h| Arc::clone(h.value())) else {
            return FabricResponse::error(format!("No service registered for topic '{}'", topic));
        };
        let request = CommandRequest::new(payload, Uuid::new_v4().to_string());
        handler.handle(topic, request).await
    }

    /// Whether any handler is currently bound to `topic`.
    pub fn has_topic(&self, topic: &str) -> bool {
        self.state.handlers.contains_key(topic)
    }
}

#[async_trait]
impl FabricClient for InProcessFabric {
    async fn connect(&self, options: &ConnectOptions) -> Result<Arc<dyn FabricConnection>> {
        tracing::info!(
            config = %options.config_path.display(),
            queue_size = options.queue_size,
            thread_count = options.thread_count,
            "Connected to in-process fabric"
        );
        Ok(Arc::new(InProcessConnection {
            state: self.state.clone(),
        }))
    }
}

struct InProcessConnection {
    state: Arc<FabricState>,
}

#[async_trait]
impl FabricConnection for InProcessConnection {
    async fn register_service(&self, registration: ServiceRegistration) -> Result<()> {
        for topic in &registration.topics {
            self.state
                .handlers
                .insert(topic.clone(), registration.handler.clone());
        }
        tracing::info!(
            service_type = %registration.service_type,
            topics = registration.topics.len(),
            "Service registered with in-process fabric"
        );
        self.state
            .services
            .insert(registration.service_type, registration.topics);
        Ok(())
    }

    async fn unregister_service(&self, service_type: &str) -> Result<()> {
        if let Some((_, topics)) = self.state.services.remove(service_type) {
            for topic in topics {
                self.state.handlers.remove(&topic);
            }
        }
        tracing::info!(service_type = %service_type, "Service unregistered from in-process fabric");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        // A dropped connection takes its registrations with it.
        self.state.handlers.clear();
        self.state.services.clear();
        tracing::info!("Disconnected from in-process fabric");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct EchoHandler;

    #[async_trait]
    impl RequestHandler for EchoHandler {
        async fn handle(&self, topic: &str, request: CommandRequest) -> FabricResponse {
            assert!(!request.correlation_id.is_empty());
            FabricResponse::normal(format!(
                "{}:{}",
                topic,
                String::from_utf8_lossy(&request.payload)
            ))
        }
    }

    fn options() -> ConnectOptions {
        ConnectOptions {
            config_path: PathBuf::from("fabric.toml"),
            queue_size: 1000,
            thread_count: 10,
        }
    }

    #[tokio::test]
    async fn registered_topic_dispatches_to_handler() {
        let fabric = InProcessFabric::new();
        let connection = fabric.connect(&options()).await.unwrap();

        connection
            .register_service(ServiceRegistration {
                service_type: "/svc".into(),
                topics: vec!["/svc".into()],
                handler: Arc::new(EchoHandler),
            })
            .await
            .unwrap();

        let response = fabric.request("/svc", "ping").await;
        assert_eq!(response, FabricResponse::normal("/svc:ping"));
    }

    #[tokio::test]
    async fn unregistered_topic_yields_error_response() {
        let fabric = InProcessFabric::new();
        let response = fabric.request("/nope", "ping").await;
        assert!(response.is_error());
    }

    #[tokio::test]
    async fn unregister_removes_the_topic_binding() {
        let fabric = InProcessFabric::new();
        let connection = fabric.connect(&options()).await.unwrap();

        connection
            .register_service(ServiceRegistration {
                service_type: "/svc".into(),
                topics: vec!["/svc".into()],
                handler: Arc::new(EchoHandler),
            })
            .await
            .unwrap();
        assert!(fabric.has_topic("/svc"));

        connection.unregister_service("/svc").await.unwrap();
        assert!(!fabric.has_topic("/svc"));
    }
}
