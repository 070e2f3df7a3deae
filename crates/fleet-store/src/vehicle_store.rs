//! Vehicle state store.
//!
//! Holds the fleet snapshot plus the view state around it (filter, selection,
//! loading flags, error, push-connected flag). State lives in a
//! `tokio::sync::watch` channel: each write is a single `send_modify`, so it
//! is atomic and subscribers see every completed write.
//!
//! Snapshot writes are last-write-wins. A REST fetch started earlier but
//! finishing later overwrites a newer push snapshot; `revision` and `source`
//! record the order writes were applied in.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fleet_api::FleetApi;
use fleet_core::{StatusFilter, Vehicle, VehicleId};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

/// Origin of the current fleet snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    /// `GET /vehicles`
    RestAll,
    /// `GET /vehicles/status/{status}`
    RestByStatus,
    /// Push-channel frame.
    Push,
}

/// Everything the vehicle views render from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleState {
    /// Fleet snapshot, in server order.
    pub vehicles: Vec<Vehicle>,
    /// Active view filter.
    pub filter: StatusFilter,
    pub selected_vehicle: Option<Vehicle>,
    /// A list fetch is in flight.
    pub loading: bool,
    /// A detail fetch is in flight.
    pub detail_loading: bool,
    /// Message of the most recent failed fetch.
    pub error: Option<String>,
    /// When the snapshot was last replaced.
    pub last_updated: Option<DateTime<Utc>>,
    /// Push channel is open.
    pub connected: bool,
    /// Incremented on every snapshot replacement.
    pub revision: u64,
    pub source: Option<SnapshotSource>,
}

impl VehicleState {
    /// Snapshot entries matching the active filter.
    pub fn filtered(&self) -> Vec<Vehicle> {
        self.vehicles
            .iter()
            .filter(|v| self.filter.matches(&v.status))
            .cloned()
            .collect()
    }

    /// Number of snapshot entries `filter` would show.
    pub fn status_count(&self, filter: StatusFilter) -> usize {
        self.vehicles
            .iter()
            .filter(|v| filter.matches(&v.status))
            .count()
    }
}

struct Inner {
    api: Arc<dyn FleetApi>,
    state: watch::Sender<VehicleState>,
}

/// Observable vehicle store. Clones share the same state.
#[derive(Clone)]
pub struct VehicleStore {
    inner: Arc<Inner>,
}

impl VehicleStore {
    #[must_use]
    pub fn new(api: Arc<dyn FleetApi>) -> Self {
        let (state, _) = watch::channel(VehicleState::default());
        Self {
            inner: Arc::new(Inner { api, state }),
        }
    }

    /// Copy of the current state.
    #[must_use]
    pub fn state(&self) -> VehicleState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified after every write.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<VehicleState> {
        self.inner.state.subscribe()
    }

    /// Snapshot filtered by the active filter.
    #[must_use]
    pub fn filtered_vehicles(&self) -> Vec<Vehicle> {
        self.inner.state.borrow().filtered()
    }

    /// Fetch the whole fleet and replace the snapshot.
    ///
    /// On failure the previous snapshot is kept and the error is recorded.
    pub async fn load_all(&self) -> StoreResult<()> {
        self.begin_load();
        match self.inner.api.list_vehicles().await {
            Ok(vehicles) => {
                self.replace_snapshot(vehicles, SnapshotSource::RestAll);
                Ok(())
            }
            Err(e) => Err(self.fail_load("Failed to fetch vehicles", e)),
        }
    }

    /// Fetch vehicles in one status from the server. `All` is `load_all`.
    pub async fn load_by_status(&self, filter: StatusFilter) -> StoreResult<()> {
        let Some(status) = filter.status() else {
            return self.load_all().await;
        };

        self.begin_load();
        match self.inner.api.list_vehicles_by_status(status).await {
            Ok(vehicles) => {
                self.replace_snapshot(vehicles, SnapshotSource::RestByStatus);
                Ok(())
            }
            Err(e) => Err(self.fail_load("Failed to fetch vehicles by status", e)),
        }
    }

    /// Fetch one vehicle and make it the selection.
    ///
    /// On failure the previous selection is kept. A list error is left in
    /// place; only a failed detail fetch writes `error`.
    pub async fn load_detail(&self, id: VehicleId) -> StoreResult<()> {
        self.inner.state.send_modify(|s| s.detail_loading = true);

        match self.inner.api.get_vehicle(id.clone()).await {
            Ok(vehicle) => {
                debug!(%id, "Vehicle detail loaded");
                self.inner.state.send_modify(|s| {
                    s.selected_vehicle = Some(vehicle);
                    s.detail_loading = false;
                });
                Ok(())
            }
            Err(e) => {
                let err = StoreError::fetch("Failed to fetch vehicle details", e);
                warn!(%id, error = %err, "Detail fetch failed");
                let message = err.to_string();
                self.inner.state.send_modify(|s| {
                    s.detail_loading = false;
                    s.error = Some(message);
                });
                Err(err)
            }
        }
    }

    /// Replace the snapshot with a pushed one.
    pub fn apply_push_snapshot(&self, vehicles: Vec<Vehicle>) {
        self.inner.state.send_modify(|s| {
            s.vehicles = vehicles;
            s.last_updated = Some(Utc::now());
            s.revision += 1;
            s.source = Some(SnapshotSource::Push);
            debug!(count = s.vehicles.len(), revision = s.revision, "Push snapshot applied");
        });
    }

    /// Change the view filter. Filtering is client-side; nothing is fetched.
    pub fn set_filter(&self, filter: StatusFilter) {
        self.inner.state.send_if_modified(|s| {
            if s.filter == filter {
                return false;
            }
            info!(filter = filter.as_str(), "Filter changed");
            s.filter = filter;
            true
        });
    }

    pub fn select_vehicle(&self, vehicle: Vehicle) {
        self.inner.state.send_modify(|s| s.selected_vehicle = Some(vehicle));
    }

    /// Select a vehicle from the current snapshot. Returns `false` when absent.
    pub fn select_vehicle_by_id(&self, id: &VehicleId) -> bool {
        self.inner.state.send_if_modified(|s| {
            match s.vehicles.iter().find(|v| &v.id == id) {
                Some(vehicle) => {
                    s.selected_vehicle = Some(vehicle.clone());
                    true
                }
                None => false,
            }
        })
    }

    pub fn clear_selection(&self) {
        self.inner.state.send_if_modified(|s| s.selected_vehicle.take().is_some());
    }

    pub fn set_connection_state(&self, connected: bool) {
        self.inner.state.send_if_modified(|s| {
            if s.connected == connected {
                return false;
            }
            s.connected = connected;
            true
        });
    }

    /// Clear `loading` after an in-flight list fetch was dropped unfinished.
    pub(crate) fn abandon_load(&self) {
        self.inner.state.send_if_modified(|s| std::mem::take(&mut s.loading));
    }

    fn begin_load(&self) {
        self.inner.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
    }

    fn replace_snapshot(&self, vehicles: Vec<Vehicle>, source: SnapshotSource) {
        self.inner.state.send_modify(|s| {
            s.vehicles = vehicles;
            s.loading = false;
            s.error = None;
            s.last_updated = Some(Utc::now());
            s.revision += 1;
            s.source = Some(source);
            debug!(
                count = s.vehicles.len(),
                revision = s.revision,
                ?source,
                "Vehicle snapshot replaced"
            );
        });
    }

    fn fail_load(&self, context: &'static str, source: fleet_api::ApiError) -> StoreError {
        let err = StoreError::fetch(context, source);
        warn!(error = %err, "Vehicle fetch failed; keeping previous snapshot");
        let message = err.to_string();
        self.inner.state.send_modify(|s| {
            s.loading = false;
            s.error = Some(message);
        });
        err
    }
}

impl std::fmt::Debug for VehicleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("VehicleStore")
            .field("vehicles", &state.vehicles.len())
            .field("filter", &state.filter)
            .field("revision", &state.revision)
            .finish()
    }
}
