//! Alert lifecycle management.
//!
//! Creation from classifier results, acknowledge/resolve transitions,
//! prioritisation for the dashboard, and escalation checks.
//!
//! # Clock injection
//! Functions that depend on "now" (ids, transitions, ages, escalation)
//! take a `now: DateTime<Utc>` parameter rather than calling `Utc::now()`
//! internally, so every transition and age computation is deterministic in
//! tests.

use chrono::{DateTime, Utc};

use crate::alert::rules::AlertRule;
use crate::model::{Alert, AlertStatus, AnomalyResult, AnomalyType};
use crate::store::{AlertStore, StoreError};

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

/// Generates an alert id: "ALT" plus six digits derived from the creation
/// instant's epoch milliseconds. `sequence` disambiguates alerts created
/// in the same instant (several anomalies in one cycle share `now`);
/// anything that still collides is caught by the store's duplicate-id
/// check.
pub fn next_alert_id(now: DateTime<Utc>, sequence: usize) -> String {
    let stamp = now.timestamp_millis().rem_euclid(1_000_000) as usize;
    format!("ALT{:06}", (stamp + sequence) % 1_000_000)
}

/// Builds an active alert from an actionable classifier result. Returns
/// `None` for a `none` result; normal usage never produces an alert.
pub fn alert_from_result(
    result: &AnomalyResult,
    now: DateTime<Utc>,
    sequence: usize,
) -> Option<Alert> {
    if result.anomaly_type == AnomalyType::None {
        return None;
    }

    Some(Alert {
        id: next_alert_id(now, sequence),
        household_id: result.household_id.clone(),
        anomaly_type: result.anomaly_type,
        severity: result.severity,
        message: result.message.clone(),
        timestamp: now,
        status: AlertStatus::Active,
        acknowledged_by: None,
        acknowledged_at: None,
        resolved_at: None,
        notifications_sent: Vec::new(),
    })
}

// ---------------------------------------------------------------------------
// Lifecycle transitions
// ---------------------------------------------------------------------------

/// Marks an active alert acknowledged by `actor`.
pub fn acknowledge(
    store: &mut dyn AlertStore,
    id: &str,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<Alert, StoreError> {
    let mut alert = store.get_alert(id)?;
    alert.status = AlertStatus::Acknowledged;
    alert.acknowledged_by = Some(actor.to_string());
    alert.acknowledged_at = Some(now);
    store.update_alert(&alert)?;
    Ok(alert)
}

/// Marks an alert resolved. An alert resolved straight from active keeps
/// its empty acknowledgement trail.
pub fn resolve(
    store: &mut dyn AlertStore,
    id: &str,
    now: DateTime<Utc>,
) -> Result<Alert, StoreError> {
    let mut alert = store.get_alert(id)?;
    alert.status = AlertStatus::Resolved;
    alert.resolved_at = Some(now);
    store.update_alert(&alert)?;
    Ok(alert)
}

// ---------------------------------------------------------------------------
// Prioritisation & display helpers
// ---------------------------------------------------------------------------

/// Dashboard ordering score: severity rank times anomaly-type weight
/// (theft 3 > blockage 2 > leak 1). Higher means more urgent.
pub fn priority_score(alert: &Alert) -> u8 {
    let type_score = match alert.anomaly_type {
        AnomalyType::Theft => 3,
        AnomalyType::Blockage => 2,
        AnomalyType::Leak => 1,
        AnomalyType::None => 0,
    };
    alert.severity.score() * type_score
}

/// Human-readable age for alert lists: "3d ago", "2h ago", "5m ago".
pub fn format_alert_age(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - timestamp).num_minutes().max(0);
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{}d ago", days)
    } else if hours > 0 {
        format!("{}h ago", hours)
    } else {
        format!("{}m ago", minutes)
    }
}

// ---------------------------------------------------------------------------
// Escalation
// ---------------------------------------------------------------------------

/// Whether an alert has sat active past its rule's escalation window.
///
/// Strictly greater than: an alert exactly at the window is not yet due.
/// Acknowledged and resolved alerts never escalate.
pub fn needs_escalation(alert: &Alert, rule: &AlertRule, now: DateTime<Utc>) -> bool {
    if !rule.escalation.enabled || alert.status != AlertStatus::Active {
        return false;
    }
    let age_minutes = (now - alert.timestamp).num_minutes();
    age_minutes > rule.escalation.time_minutes as i64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::rules::DEFAULT_RULES;
    use crate::model::Severity;
    use crate::store::memory::MemoryAlertStore;
    use chrono::{Duration, FixedOffset, TimeZone};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    fn theft_result() -> AnomalyResult {
        AnomalyResult {
            household_id: "H003".to_string(),
            anomaly_type: AnomalyType::Theft,
            severity: Severity::High,
            confidence: 95.0,
            message: "Unusual spike detected: 104.0 L/min (200% of normal)".to_string(),
            timestamp: FixedOffset::east_opt(5 * 3600 + 30 * 60)
                .unwrap()
                .with_ymd_and_hms(2024, 1, 15, 10, 30, 0)
                .unwrap(),
        }
    }

    fn none_result() -> AnomalyResult {
        AnomalyResult {
            anomaly_type: AnomalyType::None,
            severity: Severity::Low,
            confidence: 95.0,
            message: "Normal water usage detected".to_string(),
            ..theft_result()
        }
    }

    #[test]
    fn test_alert_from_actionable_result_is_active_with_empty_trail() {
        let alert = alert_from_result(&theft_result(), fixed_now(), 0).expect("theft should alert");
        assert_eq!(alert.household_id, "H003");
        assert_eq!(alert.anomaly_type, AnomalyType::Theft);
        assert_eq!(alert.status, AlertStatus::Active);
        assert!(alert.acknowledged_by.is_none());
        assert!(alert.notifications_sent.is_empty());
        assert!(alert.id.starts_with("ALT"));
    }

    #[test]
    fn test_none_result_never_becomes_an_alert() {
        assert!(alert_from_result(&none_result(), fixed_now(), 0).is_none());
    }

    #[test]
    fn test_alert_id_format() {
        let id = next_alert_id(fixed_now(), 0);
        assert_eq!(id.len(), "ALT".len() + 6);
        assert!(id[3..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_acknowledge_transition() {
        let mut store = MemoryAlertStore::new();
        let alert = alert_from_result(&theft_result(), fixed_now(), 0).unwrap();
        store.insert_alert(&alert).unwrap();

        let later = fixed_now() + Duration::minutes(10);
        let acked = acknowledge(&mut store, &alert.id, "admin@kandavara.gov.in", later).unwrap();

        assert_eq!(acked.status, AlertStatus::Acknowledged);
        assert_eq!(acked.acknowledged_by.as_deref(), Some("admin@kandavara.gov.in"));
        assert_eq!(acked.acknowledged_at, Some(later));
        // Stored copy matches the returned one.
        assert_eq!(store.get_alert(&alert.id).unwrap(), acked);
    }

    #[test]
    fn test_resolve_transition_stamps_resolved_at() {
        let mut store = MemoryAlertStore::new();
        let alert = alert_from_result(&theft_result(), fixed_now(), 0).unwrap();
        store.insert_alert(&alert).unwrap();

        let later = fixed_now() + Duration::hours(1);
        let resolved = resolve(&mut store, &alert.id, later).unwrap();
        assert_eq!(resolved.status, AlertStatus::Resolved);
        assert_eq!(resolved.resolved_at, Some(later));
    }

    #[test]
    fn test_acknowledge_missing_alert_is_not_found() {
        let mut store = MemoryAlertStore::new();
        assert!(matches!(
            acknowledge(&mut store, "ALT000000", "admin", fixed_now()),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_priority_score_ranks_high_theft_above_high_leak() {
        let mut theft = alert_from_result(&theft_result(), fixed_now(), 0).unwrap();
        theft.severity = Severity::High;
        let mut leak = theft.clone();
        leak.anomaly_type = AnomalyType::Leak;

        assert_eq!(priority_score(&theft), 9);
        assert_eq!(priority_score(&leak), 3);
        assert!(priority_score(&theft) > priority_score(&leak));
    }

    #[test]
    fn test_format_alert_age_buckets() {
        let now = fixed_now();
        assert_eq!(format_alert_age(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(format_alert_age(now - Duration::hours(2), now), "2h ago");
        assert_eq!(format_alert_age(now - Duration::days(3), now), "3d ago");
        assert_eq!(format_alert_age(now, now), "0m ago");
    }

    #[test]
    fn test_escalation_only_past_window_and_only_while_active() {
        let theft_rule = &DEFAULT_RULES[0]; // 30-minute window, enabled
        let mut alert = alert_from_result(&theft_result(), fixed_now(), 0).unwrap();

        // Exactly at the window: not yet due.
        let at_window = fixed_now() + Duration::minutes(30);
        assert!(!needs_escalation(&alert, theft_rule, at_window));

        // One minute past: due.
        let past_window = fixed_now() + Duration::minutes(31);
        assert!(needs_escalation(&alert, theft_rule, past_window));

        // Acknowledged alerts never escalate, however old.
        alert.status = AlertStatus::Acknowledged;
        assert!(!needs_escalation(&alert, theft_rule, past_window));
    }

    #[test]
    fn test_escalation_disabled_rule_never_escalates() {
        let leak_rule = &DEFAULT_RULES[1]; // escalation disabled
        let mut alert = alert_from_result(&theft_result(), fixed_now(), 0).unwrap();
        alert.anomaly_type = AnomalyType::Leak;
        let much_later = fixed_now() + Duration::days(2);
        assert!(!needs_escalation(&alert, leak_rule, much_later));
    }
}
