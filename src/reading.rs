//! A single sampled measurement and its wire representation.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Timestamp format used in both the published JSON and spreadsheet rows.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One sampled (timestamp, temperature, humidity) triple.
///
/// Created once per sampling cycle and never mutated; consumed by the
/// spreadsheet append and the MQTT publish.
///
/// Serializes to the data-topic schema:
/// `{"tstamp": "2024-01-01T00:00:00", "temp": 21.5, "hum": 48.2}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    #[serde(rename = "tstamp", with = "timestamp_format")]
    pub timestamp: NaiveDateTime,

    #[serde(rename = "temp")]
    pub temperature: f32,

    #[serde(rename = "hum")]
    pub humidity: f32,
}

impl Reading {
    /// Build a reading stamped with the current local time.
    pub fn now(temperature: f32, humidity: f32) -> Self {
        Self {
            timestamp: Local::now().naive_local(),
            temperature,
            humidity,
        }
    }
}

mod timestamp_format {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(timestamp: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&timestamp.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Reading {
        Reading {
            timestamp: NaiveDateTime::parse_from_str("2024-01-01T00:00:00", TIMESTAMP_FORMAT)
                .unwrap(),
            temperature: 21.5,
            humidity: 48.2,
        }
    }

    #[test]
    fn test_wire_schema_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert_eq!(object["tstamp"], "2024-01-01T00:00:00");
        assert!(object.contains_key("temp"));
        assert!(object.contains_key("hum"));
    }

    #[test]
    fn test_json_round_trip() {
        let original = sample();
        let encoded = serde_json::to_string(&original).unwrap();
        let decoded: Reading = serde_json::from_str(&encoded).unwrap();

        assert!((decoded.temperature - original.temperature).abs() < f32::EPSILON);
        assert!((decoded.humidity - original.humidity).abs() < f32::EPSILON);
        assert_eq!(
            decoded.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            "2024-01-01T00:00:00"
        );
    }

    #[test]
    fn test_now_captures_values() {
        let reading = Reading::now(19.0, 55.0);
        assert_eq!(reading.temperature, 19.0);
        assert_eq!(reading.humidity, 55.0);
    }
}
