//! Structured logging for the fleet tracking dashboard.
//!
//! Every fleet crate logs through `tracing` macros; this crate installs the
//! subscriber once at process start.

pub mod error;
pub mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, init_logging_with, LogFormat, LoggingConfig, DEFAULT_FILTER};
