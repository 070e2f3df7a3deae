//! Destination for decoded push updates.

use fleet_core::{Statistics, Vehicle};

/// Receives everything the push channel produces.
///
/// Implemented by the store layer. Calls arrive from the connector's session
/// task and must not block.
pub trait PushSink: Send + Sync {
    /// Full fleet snapshot from a frame's `vehicles` key.
    fn on_vehicles(&self, vehicles: Vec<Vehicle>);

    /// Statistics record from a frame's `statistics` key.
    fn on_statistics(&self, statistics: Statistics);

    /// Push channel went up (`true`) or down (`false`).
    fn on_connection_change(&self, connected: bool);
}
