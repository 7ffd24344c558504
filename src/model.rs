use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

/// One aircraft state snapshot as served by the backend.
///
/// Every field is optional at the boundary. Values of the wrong JSON type are
/// coerced where the intent is clear (numeric strings, numbers used as text)
/// and dropped otherwise, so a sloppy record still renders with placeholders.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct AircraftRecord {
    #[serde(default, deserialize_with = "de_opt_string_from_any")]
    pub icao24: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string_from_any")]
    pub callsign: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string_from_any")]
    pub origin_country: Option<String>,
    #[serde(default, deserialize_with = "de_opt_i64_from_any")]
    pub time_position: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_f64_from_any")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64_from_any")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64_from_any")]
    pub baro_altitude: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_bool_from_any")]
    pub on_ground: Option<bool>,
    #[serde(default, deserialize_with = "de_opt_f64_from_any")]
    pub velocity: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_string_from_any")]
    pub squawk: Option<String>,
}

impl AircraftRecord {
    /// Latitude and longitude, only when both are known.
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Parses a response body into records.
///
/// The body itself must be a JSON array. Elements that are not objects become
/// empty records instead of failing the whole batch.
pub fn parse_records(body: &str) -> Result<Vec<AircraftRecord>, serde_json::Error> {
    let values: Vec<Value> = serde_json::from_str(body)?;
    Ok(values
        .into_iter()
        .enumerate()
        .map(|(index, value)| record_from_value(index, value))
        .collect())
}

fn record_from_value(index: usize, value: Value) -> AircraftRecord {
    match value {
        Value::Object(_) => serde_json::from_value(value).unwrap_or_else(|err| {
            warn!("record {index} rejected, using placeholders: {err}");
            AircraftRecord::default()
        }),
        other => {
            debug!("record {index} is not an object: {other}");
            AircraftRecord::default()
        }
    }
}

fn de_opt_string_from_any<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

fn de_opt_f64_from_any<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    };
    Ok(value.filter(|v| v.is_finite()))
}

fn de_opt_i64_from_any<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|v| v.is_finite()).map(|v| v as i64)),
        Value::String(text) => {
            let trimmed = text.trim();
            if let Ok(value) = trimmed.parse::<i64>() {
                Some(value)
            } else {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(|v| v as i64)
            }
        }
        _ => None,
    })
}

fn de_opt_bool_from_any<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(flag) => Some(flag),
        Value::Number(number) => number.as_i64().map(|v| v != 0),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    })
}
