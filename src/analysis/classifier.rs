//! Rule-based anomaly classification.
//!
//! Three independent detectors (theft, leak, blockage) each inspect one
//! reading against the household baseline and either stay silent or emit a
//! fully-populated candidate result. The combination rule evaluates all
//! three unconditionally, then keeps the candidate with the highest
//! severity; ties go to the earlier detector in the fixed order
//! theft → leak → blockage. A reading no detector claims is reported as
//! normal usage with high confidence.
//!
//! The function is deterministic and side-effect-free: identical inputs
//! produce bit-identical output, and batches may be classified in any
//! order or concurrently without synchronisation.

use chrono::Timelike;

use crate::model::{AnomalyResult, AnomalyType, Baseline, Severity, WaterReading};

// ---------------------------------------------------------------------------
// Detection thresholds
// ---------------------------------------------------------------------------

/// Theft fires at 150% of the household's normal flow (inclusive).
pub const THEFT_FLOW_MULTIPLIER: f64 = 1.5;
/// Flow ratio at which a theft finding becomes medium severity.
pub const THEFT_MEDIUM_RATIO: f64 = 1.8;
/// Flow ratio at which a theft finding becomes high severity.
pub const THEFT_HIGH_RATIO: f64 = 2.0;

/// Night flow above this absolute floor is anomalous for any household,
/// regardless of its daytime usage profile. L/min, strict.
pub const LEAK_NIGHT_FLOW_LPM: f64 = 5.0;
/// Night flow above this is a medium-severity leak. L/min, strict.
pub const LEAK_MEDIUM_FLOW_LPM: f64 = 10.0;
/// Night flow above this is a high-severity leak. L/min, strict.
pub const LEAK_HIGH_FLOW_LPM: f64 = 15.0;

/// At or below this flow the blockage detector's zero-flow condition holds.
pub const BLOCKAGE_ZERO_FLOW_LPM: f64 = 0.5;
/// Pressure below this fraction of the baseline average is a low-pressure
/// condition.
pub const BLOCKAGE_PRESSURE_FACTOR: f64 = 0.7;

/// Confidence reported for a normal-usage result.
pub const NORMAL_CONFIDENCE: f64 = 95.0;

/// Night hours are 23:00 through 05:59 local time, a 7-hour window
/// {23, 0, 1, 2, 3, 4, 5}, inclusive at both ends.
pub fn is_night_hour(hour: u32) -> bool {
    hour >= 23 || hour <= 5
}

// ---------------------------------------------------------------------------
// Detectors
// ---------------------------------------------------------------------------

/// Flow-ratio spike detection. Fires when the reading draws at least
/// [`THEFT_FLOW_MULTIPLIER`] times the household's average flow.
pub fn detect_theft(reading: &WaterReading, baseline: &Baseline) -> Option<AnomalyResult> {
    let flow_ratio = reading.flow_rate_lpm / baseline.avg_flow_lpm;

    if flow_ratio < THEFT_FLOW_MULTIPLIER {
        return None;
    }

    let severity = if flow_ratio >= THEFT_HIGH_RATIO {
        Severity::High
    } else if flow_ratio >= THEFT_MEDIUM_RATIO {
        Severity::Medium
    } else {
        Severity::Low
    };

    Some(AnomalyResult {
        household_id: reading.household_id.clone(),
        anomaly_type: AnomalyType::Theft,
        severity,
        confidence: f64::min(95.0, (flow_ratio - 1.0) * 100.0),
        message: format!(
            "Unusual spike detected: {:.1} L/min ({:.0}% of normal)",
            reading.flow_rate_lpm,
            flow_ratio * 100.0
        ),
        timestamp: reading.timestamp,
    })
}

/// Night-flow leak detection. Only consults the reading's local hour and
/// absolute flow. The baseline is intentionally ignored: continuous
/// flow above the floor during night hours is anomalous for any household.
pub fn detect_leak(reading: &WaterReading) -> Option<AnomalyResult> {
    let hour = reading.timestamp.hour();

    if !is_night_hour(hour) || reading.flow_rate_lpm <= LEAK_NIGHT_FLOW_LPM {
        return None;
    }

    let severity = if reading.flow_rate_lpm > LEAK_HIGH_FLOW_LPM {
        Severity::High
    } else if reading.flow_rate_lpm > LEAK_MEDIUM_FLOW_LPM {
        Severity::Medium
    } else {
        Severity::Low
    };

    Some(AnomalyResult {
        household_id: reading.household_id.clone(),
        anomaly_type: AnomalyType::Leak,
        severity,
        confidence: f64::min(90.0, reading.flow_rate_lpm * 5.0),
        message: format!(
            "Continuous flow during night hours: {:.1} L/min",
            reading.flow_rate_lpm
        ),
        timestamp: reading.timestamp,
    })
}

/// Blockage detection: zero-flow (flow at or below the floor) or
/// low-pressure (below 70% of the household's average). High severity when
/// both hold at once. The zero-flow condition dominates confidence and the
/// message wording when both hold.
pub fn detect_blockage(reading: &WaterReading, baseline: &Baseline) -> Option<AnomalyResult> {
    let is_zero_flow = reading.flow_rate_lpm <= BLOCKAGE_ZERO_FLOW_LPM;
    let is_low_pressure =
        reading.pressure_bar < baseline.avg_pressure_bar * BLOCKAGE_PRESSURE_FACTOR;

    if !is_zero_flow && !is_low_pressure {
        return None;
    }

    let severity = if is_zero_flow && is_low_pressure {
        Severity::High
    } else {
        Severity::Medium
    };

    let (confidence, message) = if is_zero_flow {
        (
            85.0,
            format!("Zero flow detected: {:.1} L/min", reading.flow_rate_lpm),
        )
    } else {
        (
            70.0,
            format!("Low pressure detected: {:.1} bar", reading.pressure_bar),
        )
    };

    Some(AnomalyResult {
        household_id: reading.household_id.clone(),
        anomaly_type: AnomalyType::Blockage,
        severity,
        confidence,
        message,
        timestamp: reading.timestamp,
    })
}

// ---------------------------------------------------------------------------
// Combination
// ---------------------------------------------------------------------------

/// Classifies one reading against its household baseline.
///
/// All three detectors run unconditionally; they are not mutually
/// exclusive gates, and more than one can fire on a single reading. The
/// winner is the candidate with the highest severity; on ties the earlier
/// detector in theft → leak → blockage order wins. That tie-break order is
/// a contract consumers rely on, not an implementation accident.
pub fn classify(reading: &WaterReading, baseline: &Baseline) -> AnomalyResult {
    let candidates = [
        detect_theft(reading, baseline),
        detect_leak(reading),
        detect_blockage(reading, baseline),
    ];

    let mut best: Option<AnomalyResult> = None;
    for candidate in candidates.into_iter().flatten() {
        // Replace only on strictly higher severity, so the first-evaluated
        // candidate wins ties.
        match &best {
            Some(current) if candidate.severity <= current.severity => {}
            _ => best = Some(candidate),
        }
    }

    best.unwrap_or_else(|| AnomalyResult {
        household_id: reading.household_id.clone(),
        anomaly_type: AnomalyType::None,
        severity: Severity::Low,
        confidence: NORMAL_CONFIDENCE,
        message: "Normal water usage detected".to_string(),
        timestamp: reading.timestamp,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
