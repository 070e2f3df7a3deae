//! Text rendering of the store state.

use std::fmt::{Display, Write as _};

use chrono::{Local, TimeZone};
use fleet_core::format::{
    format_date_time_in, format_eta_in, format_instant_in, format_location, level_band,
    status_label, LevelBand, NOT_AVAILABLE,
};
use fleet_core::{Statistics, StatusFilter, Vehicle};
use fleet_store::{FleetStore, StatisticsState, VehicleState};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

fn band_label(band: LevelBand) -> &'static str {
    match band {
        LevelBand::Good => "ok",
        LevelBand::Low => "low",
        LevelBand::Critical => "critical",
    }
}

fn gauge(percent: f64) -> String {
    format!("{percent:.0}% {}", band_label(level_band(percent)))
}

fn vehicle_row<Tz>(vehicle: &Vehicle, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "{:<8} {:<10} {:<18} {:<10} {:>6.1} {:<22} {:<22} {:<14} {:<14} {}",
        vehicle.id.as_str(),
        vehicle.vehicle_number,
        vehicle.driver_name,
        status_label(&vehicle.status),
        vehicle.speed,
        format_location(vehicle.current_location.as_ref()),
        format_eta_in(vehicle.estimated_arrival.as_deref(), tz),
        gauge(vehicle.battery_percent()),
        gauge(vehicle.fuel_percent()),
        format_date_time_in(vehicle.last_updated.as_deref(), tz),
    )
}

/// Render the dashboard in local time.
pub fn render_summary(vehicles: &VehicleState, statistics: &StatisticsState) -> String {
    render_summary_in(vehicles, statistics, &Local)
}

/// Render the dashboard with timestamps in `tz`.
///
/// When the served statistics are still zeroed but vehicles are loaded, the
/// statistics line shows figures derived from the snapshot instead.
pub fn render_summary_in<Tz>(
    vehicles: &VehicleState,
    statistics: &StatisticsState,
    tz: &Tz,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();

    let updated = vehicles
        .last_updated
        .as_ref()
        .map(|t| format_instant_in(t, tz))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let _ = writeln!(
        out,
        "Fleet: {} vehicles | push: {} | updated {}{}",
        vehicles.vehicles.len(),
        if vehicles.connected { "connected" } else { "disconnected" },
        updated,
        if vehicles.loading { " | loading" } else { "" },
    );

    let filters: Vec<String> = StatusFilter::ALL
        .iter()
        .map(|f| {
            let entry = format!("{} {}", f.label(), vehicles.status_count(*f));
            if *f == vehicles.filter {
                format!("[{entry}]")
            } else {
                entry
            }
        })
        .collect();
    let _ = writeln!(out, "Filter: {}", filters.join(" | "));

    let (stats, derived) = if statistics.data.total == 0 && !vehicles.vehicles.is_empty() {
        (Statistics::from_vehicles(&vehicles.vehicles), true)
    } else {
        (statistics.data.clone(), false)
    };
    let _ = writeln!(
        out,
        "Statistics{}: total {} | avg speed {:.1} mph | delivered {} | en route {} | idle {}",
        if derived { " (derived)" } else { "" },
        stats.total,
        stats.average_speed,
        stats.delivered,
        stats.en_route,
        stats.idle,
    );

    for error in [&vehicles.error, &statistics.error].into_iter().flatten() {
        let _ = writeln!(out, "Error: {error}");
    }

    if let Some(selected) = &vehicles.selected_vehicle {
        let _ = writeln!(
            out,
            "Selected: {} ({}) driver {} {} -> {}",
            selected.vehicle_number,
            selected.id,
            selected.driver_name,
            selected.driver_phone,
            selected.destination,
        );
    }

    let rows = vehicles.filtered();
    if rows.is_empty() {
        let _ = writeln!(out, "No vehicles found");
    } else {
        let _ = writeln!(
            out,
            "{:<8} {:<10} {:<18} {:<10} {:>6} {:<22} {:<22} {:<14} {:<14} {}",
            "ID", "NUMBER", "DRIVER", "STATUS", "SPEED", "LOCATION", "ETA", "BATTERY", "FUEL",
            "LAST UPDATE"
        );
        for vehicle in &rows {
            let _ = writeln!(out, "{}", vehicle_row(vehicle, tz));
        }
    }

    out
}

/// Log a fresh summary after every store change until cancelled.
pub async fn run_view(store: FleetStore, shutdown_token: CancellationToken) {
    let mut vehicles_rx = store.vehicles.subscribe();
    let mut statistics_rx = store.statistics.subscribe();

    loop {
        tokio::select! {
            () = shutdown_token.cancelled() => break,
            changed = vehicles_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = statistics_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        let vehicles = vehicles_rx.borrow_and_update().clone();
        let statistics = statistics_rx.borrow_and_update().clone();
        if vehicles.loading || statistics.loading {
            continue;
        }
        info!("\n{}", render_summary(&vehicles, &statistics));
    }
    debug!("View stopped");
}
