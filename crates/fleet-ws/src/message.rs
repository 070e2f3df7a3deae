//! Push frame decoding.
//!
//! Frames are JSON objects with two optional keys:
//!
//! ```json
//! { "vehicles": [ { "id": 1, "status": "idle", ... } ], "statistics": { "total": 1, ... } }
//! ```
//!
//! The keys are independent. A key that is present but malformed is dropped
//! with a warning and does not affect the other key, so a bad `statistics`
//! object never blocks a good `vehicles` snapshot. A vehicle array is applied
//! all-or-nothing: one bad record drops the whole array.

use crate::error::{WsError, WsResult};
use fleet_core::{Statistics, Vehicle};
use serde_json::Value;
use tracing::warn;

pub const VEHICLES_KEY: &str = "vehicles";
pub const STATISTICS_KEY: &str = "statistics";

/// Decoded push frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushMessage {
    /// Replacement fleet snapshot.
    pub vehicles: Option<Vec<Vehicle>>,
    /// Replacement statistics record.
    pub statistics: Option<Statistics>,
    /// Keys that were present but dropped as malformed.
    pub rejected: Vec<&'static str>,
}

impl PushMessage {
    /// Nothing to apply.
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_none() && self.statistics.is_none()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decode one text frame.
///
/// Errors only when the frame is not a JSON object at all; malformed fields
/// inside an object are reported through `PushMessage::rejected`.
pub fn decode_frame(text: &str) -> WsResult<PushMessage> {
    let value: Value = serde_json::from_str(text)?;
    let mut fields = match value {
        Value::Object(fields) => fields,
        other => {
            return Err(WsError::ParseError(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            )))
        }
    };

    let mut message = PushMessage::default();

    match fields.remove(VEHICLES_KEY) {
        None | Some(Value::Null) => {}
        Some(raw @ Value::Array(_)) => match serde_json::from_value::<Vec<Vehicle>>(raw) {
            Ok(vehicles) => message.vehicles = Some(vehicles),
            Err(e) => {
                warn!(error = %e, "Dropping malformed vehicles payload");
                message.rejected.push(VEHICLES_KEY);
            }
        },
        Some(other) => {
            warn!(kind = json_kind(&other), "Dropping vehicles payload that is not an array");
            message.rejected.push(VEHICLES_KEY);
        }
    }

    match fields.remove(STATISTICS_KEY) {
        None | Some(Value::Null) => {}
        Some(raw @ Value::Object(_)) => match serde_json::from_value::<Statistics>(raw) {
            Ok(statistics) => message.statistics = Some(statistics),
            Err(e) => {
                warn!(error = %e, "Dropping malformed statistics payload");
                message.rejected.push(STATISTICS_KEY);
            }
        },
        Some(other) => {
            warn!(kind = json_kind(&other), "Dropping statistics payload that is not an object");
            message.rejected.push(STATISTICS_KEY);
        }
    }

    Ok(message)
}
