//! Store synchronization behaviour across REST and push sources.

use std::sync::Arc;
use std::time::Duration;

use fleet_api::{ApiCall, ApiError, MockFleetApi};
use fleet_core::{Statistics, StatusFilter, Vehicle, VehicleStatus};
use fleet_store::{FleetSession, FleetStore, SnapshotSource, VehicleStore};
use fleet_ws::{ConnectionState, PushConfig, PushConnector, PushSink};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_tungstenite::{accept_async, tungstenite::Message};

fn vehicle(id: &str, status: &str) -> Vehicle {
    Vehicle::new(id, VehicleStatus::parse(status))
}

fn ids(vehicles: &[Vehicle]) -> Vec<&str> {
    vehicles.iter().map(|v| v.id.as_str()).collect()
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_last_applied_write_wins() {
    let api = Arc::new(MockFleetApi::new());
    let all_reply = api.defer_vehicles();
    let status_reply = api.defer_vehicles_by_status();
    let store = VehicleStore::new(api.clone());

    let load_all = tokio::spawn({
        let store = store.clone();
        async move { store.load_all().await }
    });
    wait_until(|| api.calls().len() == 1).await;
    let load_idle = tokio::spawn({
        let store = store.clone();
        async move { store.load_by_status(StatusFilter::Idle).await }
    });
    wait_until(|| api.calls().len() == 2).await;

    // Started second, finishes first.
    status_reply.send(Ok(vec![vehicle("3", "idle")])).unwrap();
    load_idle.await.unwrap().unwrap();
    assert_eq!(ids(&store.state().vehicles), vec!["3"]);

    // Started first, finishes last: overwrites.
    all_reply
        .send(Ok(vec![vehicle("1", "idle"), vehicle("2", "en_route")]))
        .unwrap();
    load_all.await.unwrap().unwrap();

    let state = store.state();
    assert_eq!(ids(&state.vehicles), vec!["1", "2"]);
    assert_eq!(state.source, Some(SnapshotSource::RestAll));
    assert_eq!(state.revision, 2);

    store.apply_push_snapshot(vec![vehicle("9", "delivered")]);
    let state = store.state();
    assert_eq!(ids(&state.vehicles), vec!["9"]);
    assert_eq!(state.source, Some(SnapshotSource::Push));
    assert_eq!(state.revision, 3);
}

#[tokio::test]
async fn test_filter_is_case_insensitive_and_client_side() {
    let api = Arc::new(MockFleetApi::new());
    api.push_vehicles(Ok(vec![
        vehicle("1", "IDLE"),
        vehicle("2", "en_route"),
        vehicle("3", "Idle"),
        vehicle("4", "delivered"),
    ]));
    let store = VehicleStore::new(api.clone());
    store.load_all().await.unwrap();

    store.set_filter(StatusFilter::Idle);

    assert_eq!(ids(&store.filtered_vehicles()), vec!["1", "3"]);
    assert_eq!(store.state().vehicles.len(), 4, "snapshot itself is unfiltered");
    assert_eq!(api.calls(), vec![ApiCall::ListVehicles]);
}

#[tokio::test]
async fn test_failed_load_keeps_snapshot_then_recovers() {
    let api = Arc::new(MockFleetApi::new());
    api.push_vehicles(Ok(vec![vehicle("1", "idle")]));
    api.push_vehicles(Err(ApiError::Status {
        status: 503,
        body: "maintenance".into(),
    }));
    api.push_vehicles(Ok(vec![vehicle("2", "delivered")]));
    let store = VehicleStore::new(api.clone());

    store.load_all().await.unwrap();
    assert!(store.load_all().await.is_err());

    let state = store.state();
    assert_eq!(ids(&state.vehicles), vec!["1"]);
    assert!(!state.loading);
    let error = state.error.expect("error recorded");
    assert!(error.starts_with("Failed to fetch vehicles"), "{error}");
    assert!(error.contains("503"), "{error}");

    store.load_all().await.unwrap();
    let state = store.state();
    assert_eq!(ids(&state.vehicles), vec!["2"]);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_lenient_payload_then_filter_en_route() {
    let payload = json!([
        { "id": 1, "status": "idle", "speed": "0" },
        { "id": 2, "status": "en_route", "speed": "45" }
    ]);
    let vehicles: Vec<Vehicle> = serde_json::from_value(payload).unwrap();
    let api = Arc::new(MockFleetApi::new());
    api.push_vehicles(Ok(vehicles));
    let store = VehicleStore::new(api);

    store.load_all().await.unwrap();
    store.set_filter(StatusFilter::EnRoute);

    let filtered = store.filtered_vehicles();
    assert_eq!(ids(&filtered), vec!["2"]);
    assert_eq!(filtered[0].speed, 45.0);
}

#[tokio::test]
async fn test_store_notifies_subscribers() {
    let store = VehicleStore::new(Arc::new(MockFleetApi::new()));
    let mut rx = store.subscribe();

    store.apply_push_snapshot(vec![vehicle("1", "idle")]);

    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().vehicles.len(), 1);
}

/// One-shot push server: sends `frames` to the first client and holds the socket.
async fn push_server(frames: Vec<String>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        for frame in frames {
            ws.send(Message::Text(frame)).await.unwrap();
        }
        while let Some(Ok(msg)) = ws.next().await {
            if msg.is_close() {
                break;
            }
        }
    });
    format!("ws://{addr}")
}

#[tokio::test]
async fn test_vehicles_only_frame_leaves_statistics_untouched() {
    let url = push_server(vec![
        json!({ "vehicles": [ { "id": 5, "status": "delivered" } ] }).to_string(),
    ])
    .await;

    let api = Arc::new(MockFleetApi::new());
    api.push_statistics(Ok(Statistics {
        total: 40,
        average_speed: 31.5,
        delivered: 10,
        en_route: 20,
        idle: 10,
    }));
    let store = FleetStore::new(api.clone());
    store.statistics.load().await.unwrap();
    let before = store.statistics.state();

    let sink: Arc<dyn PushSink> = Arc::new(store.clone());
    let connector = PushConnector::new(
        PushConfig {
            max_reconnect_attempts: 0,
            ..PushConfig::with_url(url)
        },
        sink,
    );
    connector.connect().await.unwrap();
    wait_until(|| store.vehicles.state().source == Some(SnapshotSource::Push)).await;

    assert!(store.vehicles.state().connected);
    assert_eq!(ids(&store.vehicles.state().vehicles), vec!["5"]);
    assert_eq!(store.statistics.state(), before);

    connector.disconnect().await;
    connector.disconnect().await;
    assert_eq!(connector.state(), ConnectionState::Disconnected);
    assert!(!store.vehicles.state().connected);
}

#[tokio::test]
async fn test_session_wires_push_and_polling() {
    let url = push_server(vec![json!({ "statistics": { "total": 77 } }).to_string()]).await;

    let api = Arc::new(MockFleetApi::new());
    api.push_vehicles(Ok(vec![vehicle("1", "idle")]));
    let stats_reply = api.defer_statistics();
    let store = FleetStore::new(api.clone());
    let sink: Arc<dyn PushSink> = Arc::new(store.clone());
    let connector = Arc::new(PushConnector::new(PushConfig::with_url(url), sink));

    let session = FleetSession::mount(store.clone(), connector, Duration::from_secs(60)).await;
    wait_until(|| store.statistics.state().data.total == 77).await;
    wait_until(|| store.vehicles.state().vehicles.len() == 1).await;
    assert!(store.vehicles.state().connected);

    session.unmount().await;
    assert!(!store.vehicles.state().connected);
    assert!(!store.vehicles.state().loading);
    assert!(
        !store.statistics.state().loading,
        "refresh cut short by unmount must not leave the store loading"
    );
    drop(stats_reply);
}
