//! Aggregate fleet counters.

use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::vehicle::{Vehicle, VehicleStatus};

/// Fleet statistics record.
///
/// Served by the backend and replaced wholesale; missing counters read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(default, deserialize_with = "lenient::count")]
    pub total: u64,
    /// Average speed in mph.
    #[serde(default, deserialize_with = "lenient::number")]
    pub average_speed: f64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub delivered: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub en_route: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub idle: u64,
}

impl Statistics {
    /// Compute counters locally from a vehicle list.
    ///
    /// Fallback for when the served record is unavailable. Average speed is
    /// rounded to one decimal place; vehicles with an unknown status count
    /// toward `total` only.
    pub fn from_vehicles(vehicles: &[Vehicle]) -> Self {
        let mut stats = Self {
            total: vehicles.len() as u64,
            ..Self::default()
        };

        let mut speed_sum = 0.0;
        for vehicle in vehicles {
            speed_sum += vehicle.speed;
            match vehicle.status {
                VehicleStatus::Idle => stats.idle += 1,
                VehicleStatus::EnRoute => stats.en_route += 1,
                VehicleStatus::Delivered => stats.delivered += 1,
                VehicleStatus::Other(_) => {}
            }
        }

        if !vehicles.is_empty() {
            let mean = speed_sum / vehicles.len() as f64;
            stats.average_speed = (mean * 10.0).round() / 10.0;
        }

        stats
    }
}
