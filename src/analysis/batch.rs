//! Ordered batch classification.
//!
//! The batch contract: callers submit an ordered list of readings and get
//! back results in the same order and of the same length, with an optional
//! filter dropping normal-usage results before returning. Validation runs
//! over the whole batch before any classification: one malformed record
//! fails the call fast instead of being silently skipped.
//!
//! Readings in a batch are independent: nothing here carries state from
//! one reading to the next, so callers may split a batch across threads if
//! they want to.

use crate::analysis::classifier::classify;
use crate::households::BaselineProvider;
use crate::ingest::validate::validate_batch;
use crate::model::{AnomalyResult, TelemetryError, WaterReading};

/// Classifies every reading in order, resolving each household's baseline
/// through `baselines`.
///
/// With `anomalies_only` set, `none` results are dropped from the returned
/// list (the order of the surviving results is still input order).
pub fn classify_batch<P>(
    readings: &[WaterReading],
    baselines: &P,
    anomalies_only: bool,
) -> Result<Vec<AnomalyResult>, TelemetryError>
where
    P: BaselineProvider + ?Sized,
{
    validate_batch(readings)?;

    let mut results = Vec::with_capacity(readings.len());
    for reading in readings {
        let baseline = baselines.baseline_for(&reading.household_id);
        results.push(classify(reading, &baseline));
    }

    if anomalies_only {
        results.retain(|r| r.is_anomaly());
    }

    Ok(results)
}

/// Number of actionable results in a batch output (what the dashboard
/// shows as "anomalies detected").
pub fn count_anomalies(results: &[AnomalyResult]) -> usize {
    results.iter().filter(|r| r.is_anomaly()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::households::{FixedBaseline, RegistryBaselines};
    use crate::model::{AnomalyType, Baseline};
    use chrono::{FixedOffset, TimeZone};

    fn reading(household_id: &str, flow: f64, pressure: f64) -> WaterReading {
        let offset = FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap();
        WaterReading {
            household_id: household_id.to_string(),
            flow_rate_lpm: flow,
            pressure_bar: pressure,
            timestamp: offset.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_batch_preserves_order_and_length() {
        let readings = vec![
            reading("H001", 45.0, 2.5),  // normal
            reading("H002", 90.0, 2.5),  // theft against H002's baseline
            reading("H003", 52.0, 2.6),  // normal
        ];
        let results = classify_batch(&readings, &RegistryBaselines, false)
            .expect("well-formed batch should classify");

        assert_eq!(results.len(), readings.len());
        assert_eq!(results[0].household_id, "H001");
        assert_eq!(results[1].household_id, "H002");
        assert_eq!(results[2].household_id, "H003");
        assert_eq!(results[0].anomaly_type, AnomalyType::None);
        assert_eq!(results[1].anomaly_type, AnomalyType::Theft);
        assert_eq!(results[2].anomaly_type, AnomalyType::None);
    }

    #[test]
    fn test_anomalies_only_drops_normal_results() {
        let readings = vec![
            reading("H001", 45.0, 2.5),
            reading("H002", 90.0, 2.5),
            reading("H003", 52.0, 2.6),
        ];
        let results = classify_batch(&readings, &RegistryBaselines, true)
            .expect("well-formed batch should classify");

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].household_id, "H002");
        assert!(results[0].is_anomaly());
    }

    #[test]
    fn test_one_bad_record_fails_the_whole_batch() {
        let readings = vec![
            reading("H001", 45.0, 2.5),
            reading("", 45.0, 2.5), // empty household id
            reading("H003", 52.0, 2.6),
        ];
        let err = classify_batch(&readings, &RegistryBaselines, false)
            .expect_err("empty household id must fail the batch");
        assert!(
            matches!(err, TelemetryError::InvalidReading { .. }),
            "expected InvalidReading, got {:?}",
            err
        );
    }

    #[test]
    fn test_empty_batch_yields_empty_results() {
        let results = classify_batch(&[], &RegistryBaselines, false).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_unknown_household_classifies_against_default_baseline() {
        // 90 L/min against the default 45 → ratio 2.0 → theft high.
        let readings = vec![reading("H777", 90.0, 2.5)];
        let results = classify_batch(&readings, &RegistryBaselines, false).unwrap();
        assert_eq!(results[0].anomaly_type, AnomalyType::Theft);
    }

    #[test]
    fn test_injected_provider_overrides_registry() {
        // Same reading, but the injected provider's baseline makes it
        // normal instead of theft.
        let readings = vec![reading("H777", 90.0, 2.5)];
        let provider = FixedBaseline(Baseline {
            avg_flow_lpm: 90.0,
            avg_pressure_bar: 2.5,
        });
        let results = classify_batch(&readings, &provider, false).unwrap();
        assert_eq!(results[0].anomaly_type, AnomalyType::None);
    }

    #[test]
    fn test_count_anomalies_counts_actionable_results_only() {
        let readings = vec![
            reading("H001", 45.0, 2.5),
            reading("H002", 90.0, 2.5),
            reading("H003", 0.1, 2.6),
        ];
        let results = classify_batch(&readings, &RegistryBaselines, false).unwrap();
        assert_eq!(count_anomalies(&results), 2);
    }
}
