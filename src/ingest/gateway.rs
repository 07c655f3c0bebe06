//! Device-gateway API client.
//!
//! The metering vendor's gateway exposes current readings over a small
//! REST API: one call returns the latest samples for a set of household
//! connections as a JSON envelope. This module builds the request URL,
//! fetches with a blocking client, and maps the wire format onto
//! [`WaterReading`].
//!
//! Meters that are offline report `null` for flow/pressure, and a meter in
//! fault mode reports the sentinel -9999; both are dropped here rather
//! than surfaced as zero readings (a zero would look like a blockage to
//! the classifier).

use chrono::DateTime;
use serde::Deserialize;

use crate::model::{TelemetryError, WaterReading};

/// Fault-mode sentinel some meter firmware reports instead of null.
const METER_FAULT_SENTINEL: f64 = -9999.0;

// ============================================================================
// Gateway API response structures
// ============================================================================

/// Envelope of the gateway's current-readings endpoint.
#[derive(Debug, Deserialize)]
struct ReadingsResponse {
    #[allow(dead_code)]
    success: bool,
    data: Vec<WireReading>,
}

/// Single sample as the gateway reports it.
#[derive(Debug, Deserialize)]
struct WireReading {
    #[serde(rename = "householdId")]
    household_id: String,
    #[serde(rename = "flowRate")]
    flow_rate_lpm: Option<f64>,
    #[serde(rename = "pressure")]
    pressure_bar: Option<f64>,
    /// ISO 8601 with the meter's local offset.
    timestamp: String,
}

// ============================================================================
// API client functions
// ============================================================================

/// Builds the current-readings URL for a set of household connections.
///
/// `samples` asks the gateway for that many trailing samples per household
/// (1 = latest only).
pub fn build_readings_url(base_url: &str, household_ids: &[&str], samples: usize) -> String {
    format!(
        "{}/v1/readings/current?households={}&samples={}",
        base_url.trim_end_matches('/'),
        household_ids.join(","),
        samples
    )
}

/// Fetches the latest readings for the given households.
pub fn fetch_current(
    client: &reqwest::blocking::Client,
    base_url: &str,
    household_ids: &[&str],
    samples: usize,
) -> Result<Vec<WaterReading>, TelemetryError> {
    let url = build_readings_url(base_url, household_ids, samples);

    let response = client
        .get(&url)
        .header("Accept", "application/json")
        .send()
        .map_err(|e| TelemetryError::ParseError(format!("request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(TelemetryError::HttpError(response.status().as_u16()));
    }

    let body = response
        .text()
        .map_err(|e| TelemetryError::ParseError(format!("failed to read body: {}", e)))?;

    parse_readings_response(&body)
}

/// Parses the gateway envelope into domain readings.
///
/// Samples with null/sentinel values are skipped. An envelope that parses
/// but yields no usable samples is `NoData`; to the monitor loop that is
/// the same situation as every meter being offline.
pub fn parse_readings_response(body: &str) -> Result<Vec<WaterReading>, TelemetryError> {
    let envelope: ReadingsResponse =
        serde_json::from_str(body).map_err(|e| TelemetryError::ParseError(e.to_string()))?;

    let total = envelope.data.len();
    let mut readings = Vec::with_capacity(total);

    for wire in envelope.data {
        let (Some(flow), Some(pressure)) = (wire.flow_rate_lpm, wire.pressure_bar) else {
            continue; // meter offline
        };
        if flow == METER_FAULT_SENTINEL || pressure == METER_FAULT_SENTINEL {
            continue; // meter in fault mode
        }

        let timestamp = DateTime::parse_from_rfc3339(&wire.timestamp).map_err(|e| {
            TelemetryError::ParseError(format!(
                "bad timestamp '{}' for household {}: {}",
                wire.timestamp, wire.household_id, e
            ))
        })?;

        readings.push(WaterReading {
            household_id: wire.household_id,
            flow_rate_lpm: flow,
            pressure_bar: pressure,
            timestamp,
        });
    }

    if readings.is_empty() {
        return Err(TelemetryError::NoData(format!(
            "gateway returned {} samples, none usable",
            total
        )));
    }

    Ok(readings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    const SAMPLE_RESPONSE: &str = r#"{
        "success": true,
        "totalReadings": 3,
        "data": [
            {
                "householdId": "H001",
                "flowRate": 45.2,
                "pressure": 2.48,
                "timestamp": "2024-01-15T10:30:00+05:30"
            },
            {
                "householdId": "H002",
                "flowRate": null,
                "pressure": 2.4,
                "timestamp": "2024-01-15T10:30:00+05:30"
            },
            {
                "householdId": "H003",
                "flowRate": 51.7,
                "pressure": 2.61,
                "timestamp": "2024-01-15T10:30:00+05:30"
            }
        ]
    }"#;

    #[test]
    fn test_build_readings_url() {
        let url = build_readings_url("https://gw.example.net", &["H001", "H002"], 1);
        assert_eq!(
            url,
            "https://gw.example.net/v1/readings/current?households=H001,H002&samples=1"
        );
    }

    #[test]
    fn test_build_readings_url_strips_trailing_slash() {
        let url = build_readings_url("https://gw.example.net/", &["H001"], 4);
        assert!(url.starts_with("https://gw.example.net/v1/"));
        assert!(url.ends_with("samples=4"));
    }

    #[test]
    fn test_parse_keeps_usable_samples_and_skips_offline_meters() {
        let readings = parse_readings_response(SAMPLE_RESPONSE).expect("sample should parse");
        // H002's null flow is dropped, the other two survive.
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].household_id, "H001");
        assert_eq!(readings[1].household_id, "H003");
        assert_eq!(readings[0].flow_rate_lpm, 45.2);
    }

    #[test]
    fn test_parse_preserves_local_offset_hour() {
        // The +05:30 timestamps must keep their local hour; the leak
        // detector's night window runs on it.
        let readings = parse_readings_response(SAMPLE_RESPONSE).unwrap();
        assert_eq!(readings[0].timestamp.hour(), 10);
    }

    #[test]
    fn test_parse_skips_fault_sentinel() {
        let body = r#"{
            "success": true,
            "data": [
                {"householdId": "H001", "flowRate": -9999.0, "pressure": 2.5,
                 "timestamp": "2024-01-15T10:30:00+05:30"},
                {"householdId": "H002", "flowRate": 40.0, "pressure": 2.4,
                 "timestamp": "2024-01-15T10:30:00+05:30"}
            ]
        }"#;
        let readings = parse_readings_response(body).unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].household_id, "H002");
    }

    #[test]
    fn test_parse_all_unusable_is_no_data() {
        let body = r#"{
            "success": true,
            "data": [
                {"householdId": "H001", "flowRate": null, "pressure": null,
                 "timestamp": "2024-01-15T10:30:00+05:30"}
            ]
        }"#;
        let err = parse_readings_response(body).unwrap_err();
        assert!(matches!(err, TelemetryError::NoData(_)), "got {:?}", err);
    }

    #[test]
    fn test_parse_empty_data_is_no_data() {
        let err = parse_readings_response(r#"{"success": true, "data": []}"#).unwrap_err();
        assert!(matches!(err, TelemetryError::NoData(_)));
    }

    #[test]
    fn test_parse_malformed_json_is_parse_error() {
        let err = parse_readings_response("{not json").unwrap_err();
        assert!(matches!(err, TelemetryError::ParseError(_)));
    }

    #[test]
    fn test_parse_bad_timestamp_is_parse_error_naming_household() {
        let body = r#"{
            "success": true,
            "data": [
                {"householdId": "H004", "flowRate": 40.0, "pressure": 2.4,
                 "timestamp": "yesterday-ish"}
            ]
        }"#;
        match parse_readings_response(body).unwrap_err() {
            TelemetryError::ParseError(msg) => assert!(msg.contains("H004"), "got '{}'", msg),
            other => panic!("expected ParseError, got {:?}", other),
        }
    }
}
