//! REST client for the fleet tracking backend.
//!
//! All endpoints live under the `/api` base and wrap their payload in a
//! `{ "data": ... }` envelope, which the client unwraps:
//! - `GET /vehicles`
//! - `GET /vehicles/{id}`
//! - `GET /vehicles/status/{status}`
//! - `GET /statistics`
//!
//! Consumers depend on the `FleetApi` trait so stores can be driven by
//! `mock::MockFleetApi` in tests.

pub mod client;
pub mod error;
pub mod mock;

pub use client::{BoxFuture, FleetApi, VehicleApiClient};
pub use error::{ApiError, ApiResult};
pub use mock::{ApiCall, MockFleetApi};
