//! Retry behavior of the connection gate.

mod common;

use std::time::Duration;

use common::{fast_policy, FakeConnector};
use infra_init::{BackendError, CancelToken, ConnectionGate, InitError, RetryPolicy};

#[tokio::test]
async fn test_retry_exhaustion_makes_exactly_max_attempts() {
    let connector = FakeConnector::new("redpanda").unreachable();
    let mut gate = ConnectionGate::new(connector.clone(), fast_policy(3));

    let err = gate.acquire().await.err().expect("gate should give up");

    match err {
        InitError::BackendUnavailable {
            backend,
            attempts,
            source,
        } => {
            assert_eq!(backend, "redpanda");
            assert_eq!(attempts, 3);
            assert!(matches!(source, BackendError::Connect(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(gate.attempts(), 3);
    assert_eq!(connector.state().probes, 3);
    assert!(!gate.is_connected());
}

#[tokio::test]
async fn test_success_on_second_attempt() {
    let connector = FakeConnector::new("redpanda").with_probe_failures(1);
    let mut gate = ConnectionGate::new(connector.clone(), fast_policy(3));

    assert!(gate.acquire().await.is_ok());

    assert_eq!(gate.attempts(), 2);
    assert_eq!(connector.state().probes, 2);
    assert!(gate.is_connected());
}

#[tokio::test]
async fn test_client_is_built_once_across_attempts() {
    let connector = FakeConnector::new("couchbase").with_probe_failures(2);
    let mut gate = ConnectionGate::new(connector.clone(), fast_policy(5));

    gate.acquire().await.unwrap();

    assert_eq!(connector.state().connects, 1);
    assert_eq!(connector.state().probes, 3);
}

#[tokio::test]
async fn test_handle_is_cached() {
    let connector = FakeConnector::new("redpanda");
    let mut gate = ConnectionGate::new(connector.clone(), fast_policy(3));

    gate.acquire().await.unwrap();
    gate.acquire().await.unwrap();
    gate.acquire().await.unwrap();

    assert_eq!(gate.attempts(), 1);
    assert_eq!(connector.state().probes, 1);
    assert_eq!(connector.state().connects, 1);
}

#[tokio::test]
async fn test_failed_acquire_retries_on_next_call() {
    let connector = FakeConnector::new("redpanda").with_probe_failures(2);
    let mut gate = ConnectionGate::new(connector.clone(), fast_policy(2));

    assert!(gate.acquire().await.is_err());
    assert!(gate.acquire().await.is_ok());
    assert_eq!(gate.attempts(), 3);
}

#[tokio::test]
async fn test_cancelled_before_first_attempt() {
    let cancel = CancelToken::new();
    cancel.cancel();

    let connector = FakeConnector::new("redpanda");
    let mut gate = ConnectionGate::new(connector.clone(), fast_policy(3)).with_cancel(cancel);

    let err = gate.acquire().await.err().unwrap();
    assert!(matches!(err, InitError::Cancelled));
    assert_eq!(connector.state().probes, 0);
}

#[tokio::test]
async fn test_cancel_interrupts_retry_wait() {
    let cancel = CancelToken::new();
    let connector = FakeConnector::new("redpanda").unreachable();
    let policy = RetryPolicy::new(100, Duration::from_secs(60));
    let mut gate = ConnectionGate::new(connector.clone(), policy).with_cancel(cancel.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
    });

    let err = gate.acquire().await.err().unwrap();
    assert!(matches!(err, InitError::Cancelled));
    assert_eq!(connector.state().probes, 1);
}
