/// Anomaly analysis for the water-monitoring service.
///
/// Everything in here is pure: no storage, no clocks, no I/O. The
/// classifier reads a `(WaterReading, Baseline)` pair and returns one
/// `AnomalyResult`; the batch layer adds boundary validation and the
/// ordered-batch contract on top.
///
/// Submodules:
/// - `classifier` — the three detectors and the severity-ranked combination.
/// - `batch` — fail-fast validation plus ordered batch classification.

pub mod batch;
pub mod classifier;
