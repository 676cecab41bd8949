//! Mock implementations of core traits for testing.
//!
//! These mocks stand in for the fabric transport and the backend HTTP
//! executor so that lifecycle and request-handling behavior can be tested
//! without a live fabric or sandbox server.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::traits::{
    CommandInvoker, FabricClient, FabricConnection, RequestHandler, ServiceRegistration,
};
use crate::types::{CommandOutcome, ConnectOptions};

// =============================================================================
// Mock Command Invoker
// =============================================================================

/// Scripted mock invoker that returns predefined outcomes in order.
pub struct MockInvoker {
    name: String,
    outcomes: Mutex<Vec<CommandOutcome>>,
    call_count: AtomicUsize,
    commands: Mutex<Vec<String>>,
    panic_on_execute: bool,
}

impl MockInvoker {
    /// Create a mock invoker with a queue of outcomes.
    pub fn new(name: &str, outcomes: Vec<CommandOutcome>) -> Self {
        Self {
            name: name.to_string(),
            outcomes: Mutex::new(outcomes),
            call_count: AtomicUsize::new(0),
            commands: Mutex::new(Vec::new()),
            panic_on_execute: false,
        }
    }

    /// Create a mock that always returns the same outcome.
    pub fn constant(name: &str, outcome: CommandOutcome) -> Self {
        Self::new(name, vec![outcome])
    }

    /// Create a mock whose `execute` panics, for boundary tests.
    pub fn panicking(name: &str) -> Self {
        Self {
            panic_on_execute: true,
            ..Self::new(name, Vec::new())
        }
    }

    /// The number of commands executed against this mock.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// The commands executed against this mock, in order.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandInvoker for MockInvoker {
    fn backend_name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, command: &str) -> CommandOutcome {
        let count = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.commands.lock().unwrap().push(command.to_string());

        if self.panic_on_execute {
            panic!("mock invoker asked to panic");
        }

        let outcomes = self.outcomes.lock().unwrap();
        let idx = count % outcomes.len().max(1);
        outcomes
            .get(idx)
            .cloned()
            .unwrap_or_else(|| CommandOutcome::failure("no scripted outcome", None))
    }
}

// =============================================================================
// Mock Fabric
// =============================================================================

/// Mock fabric connection recording lifecycle calls.
#[derive(Default)]
pub struct MockFabricConnection {
    register_calls: AtomicUsize,
    unregister_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    hang_registration: bool,
    hang_unregistration: bool,
    fail_registration: bool,
    registration: Mutex<Option<ServiceRegistration>>,
}

impl MockFabricConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registration never acknowledges, so the caller's timeout fires.
    pub fn with_hanging_registration(mut self) -> Self {
        self.hang_registration = true;
        self
    }

    /// Unregistration never acknowledges, so the caller's timeout fires.
    pub fn with_hanging_unregistration(mut self) -> Self {
        self.hang_unregistration = true;
        self
    }

    /// Registration fails immediately.
    pub fn with_failing_registration(mut self) -> Self {
        self.fail_registration = true;
        self
    }

    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub fn unregister_calls(&self) -> usize {
        self.unregister_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    /// The topics from the most recent registration.
    pub fn registered_topics(&self) -> Vec<String> {
        self.registration
            .lock()
            .unwrap()
            .as_ref()
            .map(|r| r.topics.clone())
            .unwrap_or_default()
    }

    /// The handler from the most recent registration.
    pub fn registered_handler(&self) -> Option<Arc<dyn RequestHandler>> {
        self.registration
            .lock()
            .unwrap()
            .as_ref()
            .map(|r| r.handler.clone())
    }
}

#[async_trait]
impl FabricConnection for MockFabricConnection {
    async fn register_service(&self, registration: ServiceRegistration) -> Result<()> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_registration {
            futures::future::pending::<()>().await;
        }
        if self.fail_registration {
            return Err(Error::connection("fabric rejected the registration"));
        }
        *self.registration.lock().unwrap() = Some(registration);
        Ok(())
    }

    async fn unregister_service(&self, _service_type: &str) -> Result<()> {
        self.unregister_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_unregistration {
            futures::future::pending::<()>().await;
        }
        *self.registration.lock().unwrap() = None;
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Mock fabric client handing out a shared [`MockFabricConnection`].
pub struct MockFabricClient {
    connection: Arc<MockFabricConnection>,
    fail_connect: bool,
    connect_calls: AtomicUsize,
    last_options: Mutex<Option<ConnectOptions>>,
}

impl MockFabricClient {
    /// Create a client that hands out `connection` on every connect.
    pub fn new(connection: Arc<MockFabricConnection>) -> Self {
        Self {
            connection,
            fail_connect: false,
            connect_calls: AtomicUsize::new(0),
            last_options: Mutex::new(None),
        }
    }

    /// Every connect attempt fails.
    pub fn failing() -> Self {
        Self {
            fail_connect: true,
            ..Self::new(Arc::new(MockFabricConnection::new()))
        }
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    /// The options supplied to the most recent connect call.
    pub fn last_options(&self) -> Option<ConnectOptions> {
        self.last_options.lock().unwrap().clone()
    }
}

#[async_trait]
impl FabricClient for MockFabricClient {
    async fn connect(&self, options: &ConnectOptions) -> Result<Arc<dyn FabricConnection>> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock().unwrap() = Some(options.clone());
        if self.fail_connect {
            return Err(Error::connection("fabric unreachable"));
        }
        Ok(self.connection.clone())
    }
}
