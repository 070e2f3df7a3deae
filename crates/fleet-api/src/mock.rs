//! Scripted `FleetApi` for tests.
//!
//! Each endpoint has a FIFO of replies. A reply is either ready or deferred:
//! a deferred reply resolves when the test sends on the returned
//! `oneshot::Sender`, which lets a test complete requests in any order.

use std::collections::VecDeque;

use fleet_core::{Statistics, Vehicle, VehicleId, VehicleStatus};
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::client::{BoxFuture, FleetApi};
use crate::error::{ApiError, ApiResult};

/// Recorded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    ListVehicles,
    Vehicle(VehicleId),
    VehiclesByStatus(VehicleStatus),
    Statistics,
}

enum Reply<T> {
    Ready(ApiResult<T>),
    Deferred(oneshot::Receiver<ApiResult<T>>),
}

impl<T> Reply<T> {
    async fn resolve(self) -> ApiResult<T> {
        match self {
            Self::Ready(result) => result,
            Self::Deferred(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ApiError::Transport("deferred reply dropped".to_string()))),
        }
    }
}

type Queue<T> = Mutex<VecDeque<Reply<T>>>;

fn next_reply<T>(queue: &Queue<T>, endpoint: &str) -> Reply<T> {
    queue.lock().pop_front().unwrap_or_else(|| {
        Reply::Ready(Err(ApiError::Transport(format!(
            "no scripted reply for {endpoint}"
        ))))
    })
}

fn defer<T>(queue: &Queue<T>) -> oneshot::Sender<ApiResult<T>> {
    let (tx, rx) = oneshot::channel();
    queue.lock().push_back(Reply::Deferred(rx));
    tx
}

/// Mock fleet backend.
#[derive(Default)]
pub struct MockFleetApi {
    vehicles: Queue<Vec<Vehicle>>,
    vehicles_by_status: Queue<Vec<Vehicle>>,
    vehicle: Queue<Vehicle>,
    statistics: Queue<Statistics>,
    calls: Mutex<Vec<ApiCall>>,
}

impl MockFleetApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_vehicles(&self, result: ApiResult<Vec<Vehicle>>) {
        self.vehicles.lock().push_back(Reply::Ready(result));
    }

    pub fn defer_vehicles(&self) -> oneshot::Sender<ApiResult<Vec<Vehicle>>> {
        defer(&self.vehicles)
    }

    pub fn push_vehicles_by_status(&self, result: ApiResult<Vec<Vehicle>>) {
        self.vehicles_by_status
            .lock()
            .push_back(Reply::Ready(result));
    }

    pub fn defer_vehicles_by_status(&self) -> oneshot::Sender<ApiResult<Vec<Vehicle>>> {
        defer(&self.vehicles_by_status)
    }

    pub fn push_vehicle(&self, result: ApiResult<Vehicle>) {
        self.vehicle.lock().push_back(Reply::Ready(result));
    }

    pub fn defer_vehicle(&self) -> oneshot::Sender<ApiResult<Vehicle>> {
        defer(&self.vehicle)
    }

    pub fn push_statistics(&self, result: ApiResult<Statistics>) {
        self.statistics.lock().push_back(Reply::Ready(result));
    }

    pub fn defer_statistics(&self) -> oneshot::Sender<ApiResult<Statistics>> {
        defer(&self.statistics)
    }

    /// Requests seen so far, in call order.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().clone()
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().push(call);
    }
}

impl FleetApi for MockFleetApi {
    fn list_vehicles(&self) -> BoxFuture<'_, ApiResult<Vec<Vehicle>>> {
        self.record(ApiCall::ListVehicles);
        let reply = next_reply(&self.vehicles, "GET /vehicles");
        Box::pin(reply.resolve())
    }

    fn get_vehicle(&self, id: VehicleId) -> BoxFuture<'_, ApiResult<Vehicle>> {
        let endpoint = format!("GET /vehicles/{id}");
        self.record(ApiCall::Vehicle(id));
        let reply = next_reply(&self.vehicle, &endpoint);
        Box::pin(reply.resolve())
    }

    fn list_vehicles_by_status(
        &self,
        status: VehicleStatus,
    ) -> BoxFuture<'_, ApiResult<Vec<Vehicle>>> {
        let endpoint = format!("GET /vehicles/status/{status}");
        self.record(ApiCall::VehiclesByStatus(status));
        let reply = next_reply(&self.vehicles_by_status, &endpoint);
        Box::pin(reply.resolve())
    }

    fn get_statistics(&self) -> BoxFuture<'_, ApiResult<Statistics>> {
        self.record(ApiCall::Statistics);
        let reply = next_reply(&self.statistics, "GET /statistics");
        Box::pin(reply.resolve())
    }
}
