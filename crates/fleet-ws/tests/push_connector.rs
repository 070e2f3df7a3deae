//! Integration tests for `PushConnector` against a local WebSocket server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fleet_core::{Statistics, Vehicle};
use fleet_ws::{ConnectionState, PushConfig, PushConnector, PushSink};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio_tungstenite::{accept_async, tungstenite::Message};

#[derive(Default)]
struct RecordingSink {
    vehicles: Mutex<Vec<Vec<Vehicle>>>,
    statistics: Mutex<Vec<Statistics>>,
    changes: Mutex<Vec<bool>>,
}

impl PushSink for RecordingSink {
    fn on_vehicles(&self, vehicles: Vec<Vehicle>) {
        self.vehicles.lock().push(vehicles);
    }

    fn on_statistics(&self, statistics: Statistics) {
        self.statistics.lock().push(statistics);
    }

    fn on_connection_change(&self, connected: bool) {
        self.changes.lock().push(connected);
    }
}

struct Fixture {
    url: String,
    accepted: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
}

/// Accept connections forever. Each client gets `frames`, then the server
/// either closes (`close_after_send`) or holds the socket until the client leaves.
async fn spawn_server(frames: Vec<&'static str>, close_after_send: bool) -> Fixture {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let live = Arc::new(AtomicUsize::new(0));

    let (accepted_srv, live_srv) = (accepted.clone(), live.clone());
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let frames = frames.clone();
            let accepted = accepted_srv.clone();
            let live = live_srv.clone();
            tokio::spawn(async move {
                let Ok(mut ws) = accept_async(stream).await else {
                    return;
                };
                accepted.fetch_add(1, Ordering::SeqCst);
                live.fetch_add(1, Ordering::SeqCst);

                for frame in frames {
                    if ws.send(Message::Text(frame.to_string())).await.is_err() {
                        break;
                    }
                }
                if close_after_send {
                    let _ = ws.close(None).await;
                } else {
                    while let Some(Ok(msg)) = ws.next().await {
                        if msg.is_close() {
                            break;
                        }
                    }
                }
                live.fetch_sub(1, Ordering::SeqCst);
            });
        }
    });

    Fixture {
        url: format!("ws://{addr}"),
        accepted,
        live,
    }
}

fn config(url: &str, max_reconnect_attempts: u32) -> PushConfig {
    PushConfig {
        url: url.to_string(),
        max_reconnect_attempts,
        reconnect_base_delay_ms: 10,
        reconnect_max_delay_ms: 50,
        connect_timeout_ms: 2_000,
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_frames_routed_to_sink() {
    let server = spawn_server(
        vec![
            r#"{"vehicles":[{"id":1,"status":"idle"}]}"#,
            "not json",
            r#"{"statistics":{"total":3}}"#,
            r#"{"vehicles":[{"status":"idle"}],"statistics":{"total":4}}"#,
        ],
        false,
    )
    .await;
    let sink = Arc::new(RecordingSink::default());
    let connector = PushConnector::new(config(&server.url, 0), sink.clone());

    tokio_test::assert_ok!(connector.connect().await);
    wait_until(|| sink.statistics.lock().len() == 2).await;

    let vehicles = sink.vehicles.lock();
    assert_eq!(vehicles.len(), 1, "malformed vehicle array must be dropped");
    assert_eq!(vehicles[0][0].id.as_str(), "1");
    let totals: Vec<u64> = sink.statistics.lock().iter().map(|s| s.total).collect();
    assert_eq!(totals, vec![3, 4]);
    assert_eq!(*sink.changes.lock(), vec![true]);
    assert!(connector.is_connected());

    drop(vehicles);
    connector.disconnect().await;
}

#[tokio::test]
async fn test_connect_twice_keeps_one_live_socket() {
    let server = spawn_server(vec![], false).await;
    let sink = Arc::new(RecordingSink::default());
    let connector = PushConnector::new(config(&server.url, 0), sink.clone());

    connector.connect().await.unwrap();
    wait_until(|| connector.is_connected()).await;
    connector.connect().await.unwrap();

    wait_until(|| {
        server.accepted.load(Ordering::SeqCst) == 2 && server.live.load(Ordering::SeqCst) == 1
    })
    .await;
    wait_until(|| connector.is_connected()).await;
    assert_eq!(*sink.changes.lock(), vec![true, false, true]);

    connector.disconnect().await;
    wait_until(|| server.live.load(Ordering::SeqCst) == 0).await;
}

#[tokio::test]
async fn test_disconnect_closes_socket_and_is_idempotent() {
    let server = spawn_server(vec![], false).await;
    let sink = Arc::new(RecordingSink::default());
    let connector = PushConnector::new(config(&server.url, 5), sink.clone());

    connector.connect().await.unwrap();
    wait_until(|| connector.is_connected()).await;

    connector.disconnect().await;
    assert_eq!(connector.state(), ConnectionState::Disconnected);
    wait_until(|| server.live.load(Ordering::SeqCst) == 0).await;

    connector.disconnect().await;
    assert_eq!(sink.changes.lock().last(), Some(&false));

    // A requested close never triggers a reconnect.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.accepted.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_server_close_without_reconnect() {
    let server = spawn_server(vec![r#"{"statistics":{"total":1}}"#], true).await;
    let sink = Arc::new(RecordingSink::default());
    let connector = PushConnector::new(config(&server.url, 0), sink.clone());

    connector.connect().await.unwrap();
    wait_until(|| sink.changes.lock().as_slice() == [true, false]).await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(connector.state(), ConnectionState::Disconnected);
    assert_eq!(server.accepted.load(Ordering::SeqCst), 1);
    assert_eq!(sink.statistics.lock().len(), 1);
}

#[tokio::test]
async fn test_server_close_reconnects_with_backoff() {
    let server = spawn_server(vec![], true).await;
    let sink = Arc::new(RecordingSink::default());
    let connector = PushConnector::new(config(&server.url, 3), sink.clone());

    connector.connect().await.unwrap();
    wait_until(|| server.accepted.load(Ordering::SeqCst) >= 3).await;

    connector.disconnect().await;
    let accepted = server.accepted.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.accepted.load(Ordering::SeqCst), accepted);
    assert_eq!(connector.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_unreachable_server_gives_up() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let sink = Arc::new(RecordingSink::default());
    let connector = PushConnector::new(config(&format!("ws://{addr}"), 2), sink.clone());

    connector.connect().await.unwrap();
    wait_until(|| connector.reconnect_count() == 2).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(connector.state(), ConnectionState::Disconnected);
    assert!(!sink.changes.lock().contains(&true));
}
