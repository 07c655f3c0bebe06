/// Alerting for the water-monitoring service.
///
/// Submodules:
/// - `rules` — per-anomaly-type routing and escalation configuration.
/// - `manager` — alert lifecycle over an `AlertStore`: creation from
///   classifier results, acknowledge/resolve, prioritisation, escalation.

pub mod manager;
pub mod rules;
