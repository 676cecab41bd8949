//! Executor tests against a canned local HTTP backend.
//!
//! These spin up a minimal TCP listener that speaks just enough HTTP/1.1 to
//! serve one fixed response body, so the full reqwest round trip and the
//! text-protocol parse are exercised without a real sandbox server.

use std::sync::Arc;
use std::sync::Mutex;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use sandbox_bridge_backend::HttpCommandExecutor;
use sandbox_bridge_core::{BackendEndpoint, CommandInvoker, CommandOutcome};

/// Serve `body` for every request on a fresh local port; returns the port
/// and the request lines observed.
async fn spawn_backend(body: &'static str) -> (u16, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_writer = seen.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let seen_writer = seen_writer.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let mut request = String::new();
                loop {
                    let Ok(n) = socket.read(&mut buf).await else {
                        return;
                    };
                    if n == 0 {
                        return;
                    }
                    request.push_str(&String::from_utf8_lossy(&buf[..n]));
                    if request.contains("\r\n\r\n") {
                        break;
                    }
                }
                if let Some(line) = request.lines().next() {
                    seen_writer.lock().unwrap().push(line.to_string());
                }
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (port, seen)
}

fn executor_for(port: u16) -> HttpCommandExecutor {
    HttpCommandExecutor::new(BackendEndpoint::new("sandbox1", "127.0.0.1", port)).unwrap()
}

#[tokio::test]
async fn success_response_yields_result_body() {
    let (port, seen) = spawn_backend("OK: idle").await;
    let executor = executor_for(port);

    let outcome = executor.execute("status").await;

    assert_eq!(outcome, CommandOutcome::success("idle"));
    let requests = seen.lock().unwrap();
    assert_eq!(requests[0], "GET /status HTTP/1.1");
}

#[tokio::test]
async fn error_response_yields_failure_with_code() {
    let (port, _seen) = spawn_backend("Error 500: internal failure").await;
    let executor = executor_for(port);

    let outcome = executor.execute("status").await;

    assert_eq!(
        outcome,
        CommandOutcome::failure("internal failure", Some(500))
    );
}

#[tokio::test]
async fn malformed_response_yields_parse_failure() {
    let (port, _seen) = spawn_backend("completely unstructured").await;
    let executor = executor_for(port);

    let outcome = executor.execute("status").await;

    match outcome {
        CommandOutcome::Failure { message, code } => {
            assert!(message.contains("parse"), "unexpected message: {message}");
            assert_eq!(code, None);
        }
        CommandOutcome::Success(_) => panic!("malformed body must never succeed"),
    }
}

#[tokio::test]
async fn unreachable_backend_yields_transport_failure() {
    // Bind then drop a listener to get a port nothing is listening on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let executor = executor_for(port);
    let outcome = executor.execute("status").await;

    match outcome {
        CommandOutcome::Failure { message, code } => {
            assert!(
                message.contains("Backend request failed"),
                "unexpected message: {message}"
            );
            assert_eq!(code, None);
        }
        CommandOutcome::Success(_) => panic!("transport failure must never succeed"),
    }
}
