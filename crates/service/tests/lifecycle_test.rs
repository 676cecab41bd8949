//! Lifecycle controller tests against the mock fabric.
//!
//! Tests the full state machine: Idle -> Running -> Destroyed, the
//! registration timeout contract, teardown ordering, and the mutual
//! exclusion of concurrent lifecycle calls. Timeout paths run under
//! tokio's paused clock so the 60-second windows elapse instantly.

use std::fs;
use std::sync::Arc;

use sandbox_bridge_core::mocks::{MockFabricClient, MockFabricConnection};
use sandbox_bridge_core::{Error, FabricClient, ServiceState};
use sandbox_bridge_service::{ServiceLifecycleController, SERVICE_TYPE};

// =============================================================================
// Helpers
// =============================================================================

fn config_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("bridge.toml"),
        r#"
        [general]
        backend_name = "sandbox1"

        [backend.sandbox1]
        host = "10.0.0.5"

        [incoming_pool]
        queue_size = 500
        thread_count = 4
        "#,
    )
    .unwrap();
    fs::write(dir.path().join("fabric.toml"), "# fabric connection\n").unwrap();
    dir
}

fn controller_with(
    connection: Arc<MockFabricConnection>,
) -> (tempfile::TempDir, Arc<MockFabricClient>, ServiceLifecycleController) {
    let dir = config_dir();
    let fabric = Arc::new(MockFabricClient::new(connection));
    let controller = ServiceLifecycleController::new(dir.path(), fabric.clone() as Arc<dyn FabricClient>);
    (dir, fabric, controller)
}

// =============================================================================
// run()
// =============================================================================

#[tokio::test]
async fn run_registers_the_service_topic_and_transitions_to_running() {
    let connection = Arc::new(MockFabricConnection::new());
    let (_dir, fabric, controller) = controller_with(connection.clone());

    controller.run().await.unwrap();

    assert_eq!(controller.state().await, ServiceState::Running);
    assert_eq!(connection.register_calls(), 1);
    assert_eq!(connection.registered_topics(), vec![SERVICE_TYPE.to_string()]);

    // Pool settings from the config file reach the fabric connect options.
    let options = fabric.last_options().unwrap();
    assert_eq!(options.queue_size, 500);
    assert_eq!(options.thread_count, 4);
}

#[tokio::test]
async fn second_run_fails_while_running() {
    let (_dir, _fabric, controller) = controller_with(Arc::new(MockFabricConnection::new()));

    controller.run().await.unwrap();
    let err = controller.run().await.unwrap_err();

    assert!(matches!(err, Error::AlreadyRunning));
    assert_eq!(controller.state().await, ServiceState::Running);
}

#[tokio::test]
async fn concurrent_runs_admit_exactly_one() {
    let connection = Arc::new(MockFabricConnection::new());
    let (_dir, _fabric, controller) = controller_with(connection.clone());
    let controller = Arc::new(controller);

    let (a, b) = tokio::join!(
        {
            let c = controller.clone();
            async move { c.run().await }
        },
        {
            let c = controller.clone();
            async move { c.run().await }
        }
    );

    assert_ne!(a.is_ok(), b.is_ok(), "exactly one run() must win");
    let err = a.err().or(b.err()).unwrap();
    assert!(matches!(err, Error::AlreadyRunning));
    assert_eq!(connection.register_calls(), 1);
    assert_eq!(controller.state().await, ServiceState::Running);
}

#[tokio::test]
async fn connect_failure_leaves_the_controller_idle() {
    let dir = config_dir();
    let fabric = Arc::new(MockFabricClient::failing());
    let controller = ServiceLifecycleController::new(dir.path(), fabric as Arc<dyn FabricClient>);

    let err = controller.run().await.unwrap_err();

    assert!(matches!(err, Error::Connection(_)));
    assert_eq!(controller.state().await, ServiceState::Idle);
}

#[tokio::test]
async fn registration_failure_closes_the_connection() {
    let connection = Arc::new(MockFabricConnection::new().with_failing_registration());
    let (_dir, _fabric, controller) = controller_with(connection.clone());

    let err = controller.run().await.unwrap_err();

    assert!(matches!(err, Error::Connection(_)));
    assert_eq!(connection.disconnect_calls(), 1);
    assert_eq!(controller.state().await, ServiceState::Idle);
}

#[tokio::test(start_paused = true)]
async fn registration_timeout_closes_the_connection_and_permits_retry() {
    let connection = Arc::new(MockFabricConnection::new().with_hanging_registration());
    let (_dir, _fabric, controller) = controller_with(connection.clone());

    let err = controller.run().await.unwrap_err();

    assert!(matches!(err, Error::RegistrationTimeout { .. }));
    assert_eq!(connection.disconnect_calls(), 1, "no leaked connection");
    assert_eq!(controller.state().await, ServiceState::Idle);

    // A later run() gets past the state guard and tries again.
    let err = controller.run().await.unwrap_err();
    assert!(matches!(err, Error::RegistrationTimeout { .. }));
    assert_eq!(connection.register_calls(), 2);
}

#[tokio::test]
async fn missing_configuration_fails_before_connecting() {
    let dir = tempfile::tempdir().unwrap();
    let connection = Arc::new(MockFabricConnection::new());
    let fabric = Arc::new(MockFabricClient::new(connection));
    let controller =
        ServiceLifecycleController::new(dir.path(), fabric.clone() as Arc<dyn FabricClient>);

    let err = controller.run().await.unwrap_err();

    assert!(matches!(err, Error::Configuration(_)));
    assert_eq!(fabric.connect_calls(), 0);
    assert_eq!(controller.state().await, ServiceState::Idle);
}

// =============================================================================
// destroy()
// =============================================================================

#[tokio::test]
async fn destroy_unregisters_then_disconnects_once() {
    let connection = Arc::new(MockFabricConnection::new());
    let (_dir, _fabric, controller) = controller_with(connection.clone());

    controller.run().await.unwrap();
    controller.destroy().await.unwrap();
    // Idempotent: the second call is a no-op.
    controller.destroy().await.unwrap();

    assert_eq!(connection.unregister_calls(), 1);
    assert_eq!(connection.disconnect_calls(), 1);
    assert_eq!(controller.state().await, ServiceState::Destroyed);
}

#[tokio::test]
async fn destroy_from_idle_touches_no_resources() {
    let connection = Arc::new(MockFabricConnection::new());
    let (_dir, fabric, controller) = controller_with(connection.clone());

    controller.destroy().await.unwrap();

    assert_eq!(fabric.connect_calls(), 0);
    assert_eq!(connection.unregister_calls(), 0);
    assert_eq!(connection.disconnect_calls(), 0);
    assert_eq!(controller.state().await, ServiceState::Destroyed);
}

#[tokio::test(start_paused = true)]
async fn unregistration_timeout_still_disconnects_and_destroys() {
    let connection = Arc::new(MockFabricConnection::new().with_hanging_unregistration());
    let (_dir, _fabric, controller) = controller_with(connection.clone());

    controller.run().await.unwrap();
    controller.destroy().await.unwrap();

    assert_eq!(connection.unregister_calls(), 1);
    assert_eq!(connection.disconnect_calls(), 1);
    assert_eq!(controller.state().await, ServiceState::Destroyed);
}

#[tokio::test]
async fn run_after_destroy_is_rejected() {
    let (_dir, _fabric, controller) = controller_with(Arc::new(MockFabricConnection::new()));

    controller.destroy().await.unwrap();
    let err = controller.run().await.unwrap_err();

    assert!(matches!(err, Error::Internal(_)));
    assert_eq!(controller.state().await, ServiceState::Destroyed);
}
