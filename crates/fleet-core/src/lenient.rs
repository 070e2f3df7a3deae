//! Tolerant field deserializers.
//!
//! The backend is loose about JSON types: speeds, coordinates and counters
//! arrive either as numbers or as numeric strings, and text fields are
//! sometimes `null` or numeric. These helpers are used with
//! `#[serde(default, deserialize_with = "...")]` so that a missing field
//! falls back to the type default instead of rejecting the whole record.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{CoreError, Result};

/// Parse a numeric string the way the wire format allows (`" 45 "`, `"3.5"`).
///
/// Empty input is `None`; anything else that is not a finite number is an error.
pub fn parse_number(raw: &str) -> Result<Option<f64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Some(n)),
        _ => Err(CoreError::InvalidNumber(raw.to_string())),
    }
}

fn number_from_value(value: Value) -> Result<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| CoreError::InvalidNumber(n.to_string())),
        Value::String(s) => parse_number(&s),
        other => Err(CoreError::InvalidNumber(other.to_string())),
    }
}

/// Number or numeric string; `null` and missing read as `0.0`.
pub fn number<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_number(deserializer)?.unwrap_or(0.0))
}

/// Number or numeric string; `null` and `""` read as `None`.
pub fn opt_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    number_from_value(value).map_err(D::Error::custom)
}

/// Non-negative counter. Fractional values are rounded, negatives clamp to zero.
pub fn count<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = opt_number(deserializer)?.unwrap_or(0.0);
    Ok(value.max(0.0).round() as u64)
}

/// Text field that may also arrive as a number, bool or `null` (empty string).
pub fn string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_string(deserializer)?.unwrap_or_default())
}

/// Optional text field; `null` and `""` read as `None`.
pub fn opt_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(D::Error::custom(format!("expected text, found {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "number")]
        speed: f64,
        #[serde(default, deserialize_with = "opt_number")]
        level: Option<f64>,
        #[serde(default, deserialize_with = "count")]
        total: u64,
        #[serde(default, deserialize_with = "string")]
        name: String,
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let probe: Probe = serde_json::from_value(json!({
            "speed": "45",
            "level": " 80.5 ",
            "total": "12",
            "name": 7
        }))
        .unwrap();
        assert_eq!(probe.speed, 45.0);
        assert_eq!(probe.level, Some(80.5));
        assert_eq!(probe.total, 12);
        assert_eq!(probe.name, "7");
    }

    #[test]
    fn test_missing_and_null_fall_back_to_defaults() {
        let probe: Probe =
            serde_json::from_value(json!({ "speed": null, "level": "", "name": null })).unwrap();
        assert_eq!(probe.speed, 0.0);
        assert_eq!(probe.level, None);
        assert_eq!(probe.total, 0);
        assert_eq!(probe.name, "");
    }

    #[test]
    fn test_garbage_number_rejected() {
        let result: serde_json::Result<Probe> = serde_json::from_value(json!({ "speed": "fast" }));
        assert!(result.is_err());

        let result: serde_json::Result<Probe> = serde_json::from_value(json!({ "speed": [1] }));
        assert!(result.is_err());
    }

    #[test]
    fn test_count_rounds_and_clamps() {
        let probe: Probe = serde_json::from_value(json!({ "total": 2.6 })).unwrap();
        assert_eq!(probe.total, 3);
        let probe: Probe = serde_json::from_value(json!({ "total": -4 })).unwrap();
        assert_eq!(probe.total, 0);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("3.25").unwrap(), Some(3.25));
        assert_eq!(parse_number("  ").unwrap(), None);
        assert!(parse_number("NaN").is_err());
        assert!(parse_number("abc").is_err());
    }
}
