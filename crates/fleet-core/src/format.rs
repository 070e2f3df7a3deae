//! Display helpers for vehicle fields.
//!
//! Timestamps render as `dd/mm/yyyy, HH:MM:SS` in local time. The `_in`
//! variants take an explicit timezone.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use std::fmt::Display;

use crate::vehicle::{Location, VehicleStatus};

const DISPLAY_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// Placeholder for a missing timestamp or location.
pub const NOT_AVAILABLE: &str = "N/A";

/// Placeholder for a missing ETA.
pub const NO_ETA: &str = "-";

/// Parse an RFC 3339 timestamp, or a naive `YYYY-MM-DDTHH:MM:SS[.f]` read in `tz`.
pub fn parse_timestamp<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(tz));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| tz.from_local_datetime(&naive).earliest())
}

pub fn format_date_time(raw: Option<&str>) -> String {
    format_date_time_in(raw, &Local)
}

pub fn format_date_time_in<Tz>(raw: Option<&str>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    raw.and_then(|s| parse_timestamp(s, tz))
        .map(|dt| dt.format(DISPLAY_FORMAT).to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Format an instant already held as a `DateTime`, e.g. a store's `last_updated`.
pub fn format_instant_in<Tz>(instant: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    instant.with_timezone(tz).format(DISPLAY_FORMAT).to_string()
}

pub fn format_eta(raw: Option<&str>) -> String {
    format_eta_in(raw, &Local)
}

/// Like `format_date_time_in`, but missing, `"-"` and unparseable values render as `-`.
pub fn format_eta_in<Tz>(raw: Option<&str>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    raw.filter(|s| s.trim() != NO_ETA)
        .and_then(|s| parse_timestamp(s, tz))
        .map(|dt| dt.format(DISPLAY_FORMAT).to_string())
        .unwrap_or_else(|| NO_ETA.to_string())
}

/// `lat, lng` with four decimals.
///
/// A zero coordinate is how the backend marks an unknown fix, so it renders
/// as `N/A` like an absent location.
pub fn format_location(location: Option<&Location>) -> String {
    match location {
        Some(loc) if loc.lat != 0.0 && loc.lng != 0.0 => {
            format!("{:.4}, {:.4}", loc.lat, loc.lng)
        }
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Upper-case label with underscores as spaces (`EN ROUTE`).
pub fn status_label(status: &VehicleStatus) -> String {
    status.as_str().replace('_', " ").to_uppercase()
}

/// Severity band for battery and fuel gauges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelBand {
    Good,
    Low,
    Critical,
}

/// Above 50 is good, above 20 is low, anything else is critical.
pub fn level_band(percent: f64) -> LevelBand {
    if percent > 50.0 {
        LevelBand::Good
    } else if percent > 20.0 {
        LevelBand::Low
    } else {
        LevelBand::Critical
    }
}
