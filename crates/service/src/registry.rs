//! Topic registry: the frozen topic-to-executor routing table.
//!
//! The registry is built once while configuration is loaded and exposed as
//! an immutable lookup structure thereafter. There is no runtime add or
//! remove; lookups need no locking while the service is running.

use std::collections::HashMap;
use std::sync::Arc;

use sandbox_bridge_core::{CommandInvoker, Error, Result};

/// Builder assembling topic bindings before the registry is frozen.
#[derive(Default)]
pub struct TopicRegistryBuilder {
    bindings: HashMap<String, Arc<dyn CommandInvoker>>,
}

impl std::fmt::Debug for TopicRegistryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicRegistryBuilder")
            .field("bindings", &self.bindings)
            .finish()
    }
}

impl TopicRegistryBuilder {
    /// Bind `topic` to `invoker`.
    ///
    /// A duplicate topic is a configuration error, detected here at load
    /// time rather than at request time.
    pub fn bind(mut self, topic: impl Into<String>, invoker: Arc<dyn CommandInvoker>) -> Result<Self> {
        let topic = topic.into();
        if self.bindings.contains_key(&topic) {
            return Err(Error::configuration(format!(
                "Topic '{}' is already bound to backend '{}'",
                topic,
                self.bindings[&topic].backend_name()
            )));
        }
        tracing::debug!(topic = %topic, backend = %invoker.backend_name(), "Binding topic");
        self.bindings.insert(topic, invoker);
        Ok(self)
    }

    /// Freeze the bindings into an immutable registry.
    pub fn build(self) -> TopicRegistry {
        TopicRegistry {
            bindings: self.bindings,
        }
    }
}

/// Immutable mapping from fabric topic to backend command invoker.
pub struct TopicRegistry {
    bindings: HashMap<String, Arc<dyn CommandInvoker>>,
}

impl TopicRegistry {
    pub fn builder() -> TopicRegistryBuilder {
        TopicRegistryBuilder::default()
    }

    /// Resolve the invoker bound to `topic`.
    ///
    /// Fails for unbound topics. The controller only registers topics it
    /// has bound, so a miss here indicates a consistency bug rather than a
    /// routine condition.
    pub fn lookup(&self, topic: &str) -> Result<Arc<dyn CommandInvoker>> {
        self.bindings
            .get(topic)
            .cloned()
            .ok_or_else(|| Error::topic_not_found(topic))
    }

    /// The bound topics, in no particular order.
    pub fn topics(&self) -> Vec<String> {
        self.bindings.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandbox_bridge_core::mocks::MockInvoker;
    use sandbox_bridge_core::CommandOutcome;

    fn invoker(name: &str) -> Arc<dyn CommandInvoker> {
        Arc::new(MockInvoker::constant(name, CommandOutcome::success("ok")))
    }

    #[test]
    fn bound_topic_resolves_to_its_invoker() {
        let registry = TopicRegistry::builder()
            .bind("/svc/a", invoker("alpha"))
            .unwrap()
            .bind("/svc/b", invoker("beta"))
            .unwrap()
            .build();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup("/svc/a").unwrap().backend_name(), "alpha");
        assert_eq!(registry.lookup("/svc/b").unwrap().backend_name(), "beta");
    }

    #[test]
    fn duplicate_binding_is_rejected() {
        let err = TopicRegistry::builder()
            .bind("/svc/a", invoker("alpha"))
            .unwrap()
            .bind("/svc/a", invoker("beta"))
            .unwrap_err();

        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("/svc/a"));
    }

    #[test]
    fn unbound_topic_is_not_found() {
        let registry = TopicRegistry::builder().build();
        assert!(registry.is_empty());
        let err = registry.lookup("/svc/missing").unwrap_err();
        assert!(matches!(err, Error::TopicNotFound(_)));
    }
}
