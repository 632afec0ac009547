//! Lifecycle tests for the poller actors against a mock hub
//!
//! These cover the refresh-cycle guarantees:
//! - A failed poll clears derived state and raises the error flag
//! - A later successful poll replaces the snapshot outright, no merging
//! - The cadence keeps publishing without manual prodding
//! - Shutdown during an in-flight fetch discards the response and stops
//!   the timer for good

use std::time::Duration;

use chrono::Utc;
use fleetwatch::client::MonitorClient;
use fleetwatch::poller::{FleetPollerHandle, ServerPollerHandle};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(mock: &MockServer) -> MonitorClient {
    MonitorClient::new(&mock.uri(), Duration::from_secs(2)).unwrap()
}

fn servers_body() -> serde_json::Value {
    serde_json::json!([
        {"server_id": "web-1", "last_seen": Utc::now().to_rfc3339(), "ip_address": "10.0.0.1"}
    ])
}

#[tokio::test]
async fn failure_then_recovery_replaces_snapshot() {
    let mock = MockServer::start().await;

    // First request fails, everything after succeeds.
    Mock::given(method("GET"))
        .and(path("/servers"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock)
        .await;

    Mock::given(method("GET"))
        .and(path("/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(servers_body()))
        .mount(&mock)
        .await;

    let (handle, mut rx) = FleetPollerHandle::spawn(client_for(&mock), Duration::from_secs(60));

    // The spawn-time poll hits the failing mock.
    tokio::time::timeout(Duration::from_secs(2), rx.changed())
        .await
        .expect("first snapshot should arrive")
        .unwrap();

    let failed = rx.borrow_and_update().clone();
    assert!(failed.error.is_some(), "failure must raise the error flag");
    assert!(failed.servers.is_empty(), "failure must clear derived state");

    // Recovery: the next poll replaces the snapshot and clears the flag.
    handle.poll_now().await.unwrap();

    let recovered = rx.borrow_and_update().clone();
    assert!(recovered.error.is_none());
    assert_eq!(recovered.servers.len(), 1);
    assert_eq!(recovered.servers[0].server_id, "web-1");
    assert!(recovered.generation > failed.generation);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn success_then_failure_does_not_keep_stale_servers() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(servers_body()))
        .up_to_n_times(1)
        .mount(&mock)
        .await;

    Mock::given(method("GET"))
        .and(path("/servers"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock)
        .await;

    let (handle, mut rx) = FleetPollerHandle::spawn(client_for(&mock), Duration::from_secs(60));

    tokio::time::timeout(Duration::from_secs(2), rx.changed())
        .await
        .expect("first snapshot should arrive")
        .unwrap();
    assert_eq!(rx.borrow_and_update().servers.len(), 1);

    handle.poll_now().await.unwrap();

    // Staleness must never be presented as liveness: the failed poll wipes
    // the previous good data instead of freezing on it.
    let snapshot = rx.borrow_and_update().clone();
    assert!(snapshot.servers.is_empty());
    assert!(snapshot.error.is_some());

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn cadence_keeps_publishing_without_commands() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(servers_body()))
        .mount(&mock)
        .await;

    let (handle, rx) = FleetPollerHandle::spawn(client_for(&mock), Duration::from_millis(50));

    tokio::time::sleep(Duration::from_millis(400)).await;

    let generation = rx.borrow().generation;
    assert!(
        generation >= 3,
        "expected several poll generations, got {generation}"
    );

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_during_in_flight_fetch_discards_the_response() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/servers"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(servers_body())
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock)
        .await;

    let (handle, rx) = FleetPollerHandle::spawn(client_for(&mock), Duration::from_secs(60));

    // Let the spawn-time fetch get going, then tear the poller down under it.
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.shutdown().await.unwrap();

    // Wait past the delayed response: it must land nowhere.
    tokio::time::sleep(Duration::from_millis(700)).await;

    let snapshot = rx.borrow().clone();
    assert_eq!(snapshot.generation, 0, "no snapshot may apply after teardown");
    assert!(snapshot.refreshed_at.is_none());
}

#[tokio::test]
async fn commands_are_serviced_during_an_in_flight_fetch() {
    let mock = MockServer::start().await;

    // The slow first response pins a fetch in flight; the follow-up is fast.
    Mock::given(method("GET"))
        .and(path("/servers"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(servers_body())
                .set_delay(Duration::from_millis(500)),
        )
        .up_to_n_times(1)
        .mount(&mock)
        .await;

    Mock::given(method("GET"))
        .and(path("/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(servers_body()))
        .mount(&mock)
        .await;

    let (handle, rx) = FleetPollerHandle::spawn(client_for(&mock), Duration::from_secs(60));

    // Let the spawn-time fetch get stuck in the slow response, then issue a
    // command under it. The poller must pick it up rather than sit deaf
    // until the fetch resolves on its own.
    tokio::time::sleep(Duration::from_millis(100)).await;

    tokio::time::timeout(Duration::from_secs(2), handle.poll_now())
        .await
        .expect("poll_now must be serviced while a fetch is in flight")
        .unwrap();

    let snapshot = rx.borrow().clone();
    assert!(snapshot.error.is_none());
    assert_eq!(snapshot.servers.len(), 1);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_releases_the_timer() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(servers_body()))
        .mount(&mock)
        .await;

    let (handle, _rx) = FleetPollerHandle::spawn(client_for(&mock), Duration::from_millis(50));

    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.shutdown().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let requests_at_shutdown = mock.received_requests().await.unwrap_or_default().len();

    // No dangling timer: the request count stays put after teardown.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let requests_later = mock.received_requests().await.unwrap_or_default().len();

    assert_eq!(requests_at_shutdown, requests_later);
}

#[tokio::test]
async fn dropping_the_handle_stops_the_poller() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(servers_body()))
        .mount(&mock)
        .await;

    let (handle, _rx) = FleetPollerHandle::spawn(client_for(&mock), Duration::from_millis(50));

    tokio::time::sleep(Duration::from_millis(150)).await;
    drop(handle);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let requests_after_drop = mock.received_requests().await.unwrap_or_default().len();
    tokio::time::sleep(Duration::from_millis(300)).await;
    let requests_later = mock.received_requests().await.unwrap_or_default().len();

    assert_eq!(requests_after_drop, requests_later);
}

#[tokio::test]
async fn server_poller_failure_then_recovery() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/metrics/web-1"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock)
        .await;

    Mock::given(method("GET"))
        .and(path("/metrics/web-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "time": "2026-08-30T12:00:01Z",
                "server_id": "web-1",
                "metric_type": "cpu_usage",
                "resource": "",
                "value": 40.0,
                "tags": {}
            }
        ])))
        .mount(&mock)
        .await;

    Mock::given(method("GET"))
        .and(path("/servers/web-1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"service_name": "nginx", "status": 1, "last_seen": "2026-08-30T12:00:00Z"}
        ])))
        .mount(&mock)
        .await;

    let (handle, mut rx) = ServerPollerHandle::spawn(
        client_for(&mock),
        "web-1".to_string(),
        Duration::from_secs(60),
    );

    tokio::time::timeout(Duration::from_secs(2), rx.changed())
        .await
        .expect("first snapshot should arrive")
        .unwrap();

    let failed = rx.borrow_and_update().clone();
    assert!(failed.error.is_some());
    assert!(failed.series.is_empty());
    assert!(failed.services.is_empty());

    handle.poll_now().await.unwrap();

    let recovered = rx.borrow_and_update().clone();
    assert!(recovered.error.is_none());
    assert_eq!(recovered.series.cpu, vec![40.0]);
    assert_eq!(recovered.services.len(), 1);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn server_poller_shutdown_discards_in_flight_fetch() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/metrics/web-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([]))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock)
        .await;

    Mock::given(method("GET"))
        .and(path("/servers/web-1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock)
        .await;

    let (handle, rx) = ServerPollerHandle::spawn(
        client_for(&mock),
        "web-1".to_string(),
        Duration::from_secs(60),
    );

    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.shutdown().await.unwrap();
    tokio::time::sleep(Duration::from_millis(700)).await;

    let snapshot = rx.borrow().clone();
    assert_eq!(snapshot.generation, 0);
    assert!(snapshot.refreshed_at.is_none());
}
