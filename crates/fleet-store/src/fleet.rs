//! Both stores behind one handle, wired as the push channel's sink.

use std::sync::Arc;

use fleet_api::FleetApi;
use fleet_core::{Statistics, Vehicle};
use fleet_ws::PushSink;
use tracing::info;

use crate::error::StoreResult;
use crate::statistics_store::StatisticsStore;
use crate::vehicle_store::VehicleStore;

/// Vehicle and statistics stores sharing one API client.
#[derive(Clone)]
pub struct FleetStore {
    pub vehicles: VehicleStore,
    pub statistics: StatisticsStore,
}

impl FleetStore {
    #[must_use]
    pub fn new(api: Arc<dyn FleetApi>) -> Self {
        Self {
            vehicles: VehicleStore::new(api.clone()),
            statistics: StatisticsStore::new(api),
        }
    }

    /// Fetch the fleet and the statistics concurrently.
    ///
    /// Both fetches run to completion; the first error is returned.
    pub async fn refresh(&self) -> StoreResult<()> {
        let (vehicles, statistics) = tokio::join!(self.vehicles.load_all(), self.statistics.load());
        vehicles.and(statistics)
    }

    /// Reset the loading flags of a `refresh` that was cancelled mid-flight.
    pub(crate) fn abandon_refresh(&self) {
        self.vehicles.abandon_load();
        self.statistics.abandon_load();
    }

    /// Statistics computed from the current vehicle snapshot.
    ///
    /// A fallback view for when the served record is missing or stale; it is
    /// never written into the statistics store.
    #[must_use]
    pub fn derived_statistics(&self) -> Statistics {
        Statistics::from_vehicles(&self.vehicles.state().vehicles)
    }
}

impl PushSink for FleetStore {
    fn on_vehicles(&self, vehicles: Vec<Vehicle>) {
        self.vehicles.apply_push_snapshot(vehicles);
    }

    fn on_statistics(&self, statistics: Statistics) {
        self.statistics.apply_push_snapshot(statistics);
    }

    fn on_connection_change(&self, connected: bool) {
        info!(connected, "Push connection changed");
        self.vehicles.set_connection_state(connected);
    }
}
