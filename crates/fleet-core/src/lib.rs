//! Core domain types for the fleet tracking dashboard.
//!
//! This crate provides the records shared by every other fleet crate:
//! - `Vehicle`: server-defined vehicle record, replaced wholesale on update
//! - `VehicleStatus`, `StatusFilter`: status enum and the view filter over it
//! - `Statistics`: aggregate fleet counters
//! - `format`: display helpers for timestamps and coordinates

pub mod error;
pub mod format;
pub mod lenient;
pub mod statistics;
pub mod vehicle;

pub use error::{CoreError, Result};
pub use statistics::Statistics;
pub use vehicle::{Location, StatusFilter, Vehicle, VehicleId, VehicleStatus};
