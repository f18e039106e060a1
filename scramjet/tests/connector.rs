//! Deadline races of the connector against a scripted network.
//!
//! All tests run on tokio's paused clock, so latencies are exact.

mod common;

use std::time::Duration;

use common::{Resolution, TestProviders, addr, endpoint, init_tracing};
use scramjet::{AbortSignal, ConnectError, Connector, PhaseBudget, Providers, TimeProvider};

#[tokio::test(start_paused = true)]
async fn test_resolve_slower_than_deadline_times_out_once() {
    init_tracing();
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let providers = TestProviders::new();
            providers.network.script.borrow_mut().resolve_delay = Duration::from_millis(500);
            let time = providers.time().clone();
            let connector = Connector::new(providers.clone());

            let started = time.now();
            let result = connector
                .connect(&endpoint(), Duration::from_millis(100))
                .await;

            assert_eq!(result.err(), Some(ConnectError::Timeout));
            let elapsed = time.now() - started;
            assert!(elapsed >= Duration::from_millis(100) && elapsed < Duration::from_millis(150));

            // Give the cancelled resolution ample time to "arrive".
            time.sleep(Duration::from_secs(2)).await.expect("sleep");

            let script = providers.network.script.borrow();
            assert_eq!(script.resolve_calls, 1);
            assert_eq!(script.resolves_completed, 0, "loser must be cancelled");
            assert!(script.connect_calls.is_empty());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_resolution_failure_is_host_not_found() {
    init_tracing();
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let providers = TestProviders::new();
            providers.network.script.borrow_mut().resolution = Resolution::Fail;
            let connector = Connector::new(providers.clone());

            let result = connector.connect(&endpoint(), Duration::from_secs(1)).await;
            assert_eq!(result.err(), Some(ConnectError::HostNotFound));

            providers.network.script.borrow_mut().resolution = Resolution::Addrs(Vec::new());
            let result = connector.connect(&endpoint(), Duration::from_secs(1)).await;
            assert_eq!(result.err(), Some(ConnectError::HostNotFound));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_addresses_tried_in_order() {
    init_tracing();
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let providers = TestProviders::new();
            {
                let mut script = providers.network.script.borrow_mut();
                script.resolution = Resolution::Addrs(vec![addr(1), addr(2), addr(3)]);
                script.refused = vec![addr(1)];
            }
            let _server = providers.network.accept_next();
            let connector = Connector::new(providers.clone());

            let result = connector.connect(&endpoint(), Duration::from_secs(1)).await;

            assert!(result.is_ok());
            assert_eq!(
                providers.network.script.borrow().connect_calls,
                vec![addr(1), addr(2)]
            );
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_all_refused_is_connection_refused() {
    init_tracing();
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let providers = TestProviders::new();
            {
                let mut script = providers.network.script.borrow_mut();
                script.resolution = Resolution::Addrs(vec![addr(1), addr(2)]);
                script.refused = vec![addr(1), addr(2)];
            }
            let connector = Connector::new(providers.clone());

            let result = connector.connect(&endpoint(), Duration::from_secs(1)).await;

            assert_eq!(result.err(), Some(ConnectError::ConnectionRefused));
            assert_eq!(providers.network.script.borrow().connect_calls.len(), 2);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_connect_slower_than_deadline_times_out() {
    init_tracing();
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let providers = TestProviders::new();
            providers.network.script.borrow_mut().connect_delay = Duration::from_millis(300);
            let _server = providers.network.accept_next();
            let time = providers.time().clone();
            let connector = Connector::new(providers.clone());

            let result = connector
                .connect(&endpoint(), Duration::from_millis(100))
                .await;
            assert_eq!(result.err(), Some(ConnectError::Timeout));

            time.sleep(Duration::from_secs(1)).await.expect("sleep");
            let script = providers.network.script.borrow();
            assert_eq!(script.connects_completed, 0);
            assert_eq!(script.transports.len(), 1, "transport never handed out");
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_phase_budget() {
    init_tracing();
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let providers = TestProviders::new();
            {
                let mut script = providers.network.script.borrow_mut();
                script.resolve_delay = Duration::from_millis(80);
                script.connect_delay = Duration::from_millis(50);
            }
            let timeout = Duration::from_millis(100);

            // Fresh: the connect phase gets its own 100ms.
            let _server = providers.network.accept_next();
            let fresh = Connector::new(providers.clone());
            assert_eq!(fresh.phase_budget(), PhaseBudget::Fresh);
            assert!(fresh.connect(&endpoint(), timeout).await.is_ok());

            // Remaining: only 20ms are left after resolution.
            let _server = providers.network.accept_next();
            let remaining =
                Connector::new(providers.clone()).with_phase_budget(PhaseBudget::Remaining);
            assert_eq!(
                remaining.connect(&endpoint(), timeout).await.err(),
                Some(ConnectError::Timeout)
            );
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_abort_cancels_attempt() {
    init_tracing();
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let providers = TestProviders::new();
            providers.network.script.borrow_mut().resolve_delay = Duration::from_secs(10);
            let time = providers.time().clone();
            let connector = Connector::new(providers.clone());
            let abort = AbortSignal::new();

            let trigger = abort.clone();
            let trigger_time = time.clone();
            tokio::task::spawn_local(async move {
                let _ = trigger_time.sleep(Duration::from_millis(50)).await;
                trigger.abort();
            });

            let started = time.now();
            let result = connector
                .connect_with_abort(&endpoint(), Duration::from_secs(30), &abort)
                .await;

            assert_eq!(result.err(), Some(ConnectError::OperationAborted));
            let elapsed = time.now() - started;
            assert!(elapsed >= Duration::from_millis(50) && elapsed < Duration::from_millis(100));
        })
        .await;
}
