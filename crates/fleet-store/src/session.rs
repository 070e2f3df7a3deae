//! Mounted dashboard session.
//!
//! A `FleetSession` owns the two resources a mounted view holds: the periodic
//! REST refresh and the push connection. `mount` acquires both; `unmount`
//! releases both and waits for them. Dropping a session without unmounting
//! (error path, panic unwind) cancels both without waiting.

use std::sync::Arc;
use std::time::Duration;

use fleet_ws::PushConnector;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::fleet::FleetStore;

/// Reconciliation poll period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(180);

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub struct FleetSession {
    store: FleetStore,
    connector: Arc<PushConnector>,
    shutdown_token: CancellationToken,
    poller: Option<JoinHandle<()>>,
}

impl FleetSession {
    /// Open the push channel and start polling.
    ///
    /// The first poll fires immediately, so mounting also performs the
    /// initial load. A push channel that cannot start is logged and the
    /// session runs on polling alone.
    pub async fn mount(
        store: FleetStore,
        connector: Arc<PushConnector>,
        poll_interval: Duration,
    ) -> Self {
        info!(
            poll_interval_secs = poll_interval.as_secs_f64(),
            push_url = connector.url(),
            "Mounting fleet session"
        );

        if let Err(e) = connector.connect().await {
            warn!(error = %e, "Push channel unavailable; relying on polling");
        }

        let shutdown_token = CancellationToken::new();
        let poller = tokio::spawn(poll_loop(
            store.clone(),
            poll_interval.max(MIN_POLL_INTERVAL),
            shutdown_token.clone(),
        ));

        Self {
            store,
            connector,
            shutdown_token,
            poller: Some(poller),
        }
    }

    pub fn store(&self) -> &FleetStore {
        &self.store
    }

    pub fn connector(&self) -> &Arc<PushConnector> {
        &self.connector
    }

    /// Stop polling and close the push channel, waiting for both.
    pub async fn unmount(mut self) {
        self.shutdown_token.cancel();
        if let Some(poller) = self.poller.take() {
            if let Err(e) = poller.await {
                warn!(?e, "Poll task ended abnormally");
            }
        }
        self.connector.disconnect().await;
        info!("Fleet session unmounted");
    }
}

impl Drop for FleetSession {
    fn drop(&mut self) {
        if let Some(poller) = self.poller.take() {
            self.shutdown_token.cancel();
            poller.abort();
            self.store.abandon_refresh();
            self.connector.close_now();
            debug!("Fleet session dropped without unmount");
        }
    }
}

async fn poll_loop(store: FleetStore, period: Duration, shutdown_token: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = shutdown_token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        debug!("Polling fleet backend");
        tokio::select! {
            () = shutdown_token.cancelled() => {
                store.abandon_refresh();
                break;
            }
            result = store.refresh() => {
                if let Err(e) = result {
                    debug!(error = %e, "Poll refresh incomplete");
                }
            }
        }
    }
    debug!("Poll loop stopped");
}
