//! Client-side state for the fleet tracking dashboard.
//!
//! Two observable stores hold the canonical in-memory data:
//! - `VehicleStore`: fleet snapshot, filter, selection, loading/error flags
//! - `StatisticsStore`: aggregate statistics record
//!
//! Both are written by REST fetches and by the push channel (through
//! `FleetStore`, which implements `PushSink`). Every write replaces the
//! previous value wholesale, so the last completed write wins.
//! `FleetSession` scopes the poll timer and the push connection.

pub mod error;
pub mod fleet;
pub mod session;
pub mod statistics_store;
pub mod vehicle_store;

pub use error::{StoreError, StoreResult};
pub use fleet::FleetStore;
pub use session::{FleetSession, DEFAULT_POLL_INTERVAL};
pub use statistics_store::{StatisticsState, StatisticsStore};
pub use vehicle_store::{SnapshotSource, VehicleState, VehicleStore};
