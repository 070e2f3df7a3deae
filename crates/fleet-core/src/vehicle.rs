//! Vehicle records and status filtering.
//!
//! Vehicles are server-defined records consumed as-is. The client never
//! edits a field; a newer record replaces the old one wholesale.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::lenient;

/// Unique vehicle key.
///
/// The backend sends ids as numbers or strings; both are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(String);

impl VehicleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VehicleId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for VehicleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for VehicleId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for VehicleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for VehicleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient::string(deserializer).map(Self)
    }
}

/// Vehicle status as reported by the server.
///
/// Parsing is case-insensitive and treats spaces and dashes like
/// underscores, so `"En Route"` and `"en-route"` are both `EnRoute`.
/// Unknown values are kept verbatim instead of failing the record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VehicleStatus {
    Idle,
    EnRoute,
    Delivered,
    Other(String),
}

impl VehicleStatus {
    pub fn parse(raw: &str) -> Self {
        let normalized: String = raw
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        match normalized.as_str() {
            "idle" => Self::Idle,
            "en_route" | "enroute" => Self::EnRoute,
            "delivered" => Self::Delivered,
            _ => Self::Other(raw.to_string()),
        }
    }

    /// Wire representation (`"idle"`, `"en_route"`, `"delivered"`).
    pub fn as_str(&self) -> &str {
        match self {
            Self::Idle => "idle",
            Self::EnRoute => "en_route",
            Self::Delivered => "delivered",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl Default for VehicleStatus {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for VehicleStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for VehicleStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = lenient::string(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Current position of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, deserialize_with = "lenient::number")]
    pub lat: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub lng: f64,
}

/// A single vehicle record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: VehicleId,
    #[serde(default, deserialize_with = "lenient::string")]
    pub vehicle_number: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub driver_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub driver_phone: String,
    #[serde(default)]
    pub status: VehicleStatus,
    /// Speed in mph.
    #[serde(default, deserialize_with = "lenient::number")]
    pub speed: f64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub destination: String,
    #[serde(default)]
    pub current_location: Option<Location>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub estimated_arrival: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub battery_level: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub fuel_level: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub last_updated: Option<String>,
}

impl Vehicle {
    /// Minimal record, mostly for tests and fixtures.
    pub fn new(id: impl Into<VehicleId>, status: VehicleStatus) -> Self {
        Self {
            id: id.into(),
            vehicle_number: String::new(),
            driver_name: String::new(),
            driver_phone: String::new(),
            status,
            speed: 0.0,
            destination: String::new(),
            current_location: None,
            estimated_arrival: None,
            battery_level: None,
            fuel_level: None,
            last_updated: None,
        }
    }

    /// Battery percentage, `0` when the server omitted it.
    pub fn battery_percent(&self) -> f64 {
        self.battery_level.unwrap_or(0.0)
    }

    /// Fuel percentage, `0` when the server omitted it.
    pub fn fuel_percent(&self) -> f64 {
        self.fuel_level.unwrap_or(0.0)
    }
}

/// Status filter selected in the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Idle,
    EnRoute,
    Delivered,
}

impl StatusFilter {
    /// Every filter, in display order.
    pub const ALL: [StatusFilter; 4] = [
        StatusFilter::All,
        StatusFilter::Idle,
        StatusFilter::EnRoute,
        StatusFilter::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Idle => "idle",
            Self::EnRoute => "en_route",
            Self::Delivered => "delivered",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Idle => "Idle",
            Self::EnRoute => "En Route",
            Self::Delivered => "Delivered",
        }
    }

    /// Status this filter selects, `None` for `All`.
    pub fn status(&self) -> Option<VehicleStatus> {
        match self {
            Self::All => None,
            Self::Idle => Some(VehicleStatus::Idle),
            Self::EnRoute => Some(VehicleStatus::EnRoute),
            Self::Delivered => Some(VehicleStatus::Delivered),
        }
    }

    pub fn matches(&self, status: &VehicleStatus) -> bool {
        match self {
            Self::All => true,
            Self::Idle => *status == VehicleStatus::Idle,
            Self::EnRoute => *status == VehicleStatus::EnRoute,
            Self::Delivered => *status == VehicleStatus::Delivered,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        match VehicleStatus::parse(s) {
            VehicleStatus::Idle => Ok(Self::Idle),
            VehicleStatus::EnRoute => Ok(Self::EnRoute),
            VehicleStatus::Delivered => Ok(Self::Delivered),
            VehicleStatus::Other(_) => Err(CoreError::InvalidFilter(s.to_string())),
        }
    }
}

impl From<VehicleStatus> for StatusFilter {
    /// Unknown statuses have no filter of their own and map to `All`.
    fn from(status: VehicleStatus) -> Self {
        match status {
            VehicleStatus::Idle => Self::Idle,
            VehicleStatus::EnRoute => Self::EnRoute,
            VehicleStatus::Delivered => Self::Delivered,
            VehicleStatus::Other(_) => Self::All,
        }
    }
}
