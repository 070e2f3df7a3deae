//! Headless fleet tracking dashboard.
//!
//! Wires the REST client, push connector and stores together from a TOML
//! config and renders a text summary whenever the stores change:
//! - `config`: file + environment configuration
//! - `app`: component wiring and the mount/unmount lifecycle
//! - `view`: text rendering of the store state

pub mod app;
pub mod config;
pub mod error;
pub mod view;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
