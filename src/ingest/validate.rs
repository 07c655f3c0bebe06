//! Boundary validation for submitted readings.
//!
//! The classifier itself never fails on a well-formed reading, so shape
//! checking happens here, before classification. A batch with one bad
//! record is rejected as a whole, and the error names the offending record so
//! the submitter can fix it, rather than the service silently dropping it.
//!
//! Rust's types already rule out missing fields and wrong-typed values at
//! the serde layer; what remains checkable here is emptiness and the
//! numeric domain (finite, non-negative).

use crate::model::{TelemetryError, WaterReading};

/// Validates a single reading against the input contract: non-empty
/// household id, finite non-negative flow and pressure.
pub fn validate_reading(reading: &WaterReading) -> Result<(), TelemetryError> {
    if reading.household_id.trim().is_empty() {
        return Err(TelemetryError::InvalidReading {
            household_id: reading.household_id.clone(),
            reason: "household id is empty".to_string(),
        });
    }

    if !reading.flow_rate_lpm.is_finite() || reading.flow_rate_lpm < 0.0 {
        return Err(TelemetryError::InvalidReading {
            household_id: reading.household_id.clone(),
            reason: format!("flow rate must be a non-negative number, got {}", reading.flow_rate_lpm),
        });
    }

    if !reading.pressure_bar.is_finite() || reading.pressure_bar < 0.0 {
        return Err(TelemetryError::InvalidReading {
            household_id: reading.household_id.clone(),
            reason: format!("pressure must be a non-negative number, got {}", reading.pressure_bar),
        });
    }

    Ok(())
}

/// Validates every reading in submission order, failing fast on the first
/// bad record.
pub fn validate_batch(readings: &[WaterReading]) -> Result<(), TelemetryError> {
    for reading in readings {
        validate_reading(reading)?;
    }
    Ok(())
}
