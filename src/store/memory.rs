//! In-memory store implementations.
//!
//! Used by the service in dev mode and by every test. Semantics match the
//! SQL implementations: alert queries come back newest first, recipient
//! queries sorted by name, limits applied after sorting.

use chrono::{DateTime, Duration, Utc};

use crate::model::{
    Alert, BroadcastMessage, Recipient, RecipientGroup, WaterReading,
};
use crate::store::{
    AlertFilter, AlertStore, BroadcastStore, GroupCounts, ReadingStore, RecipientFilter,
    RecipientStore, StoreError,
};

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryReadingStore {
    readings: Vec<WaterReading>,
}

impl MemoryReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

impl ReadingStore for MemoryReadingStore {
    fn insert_readings(&mut self, readings: &[WaterReading]) -> Result<usize, StoreError> {
        self.readings.extend_from_slice(readings);
        Ok(readings.len())
    }

    fn recent_readings(
        &mut self,
        household_id: &str,
        limit: usize,
    ) -> Result<Vec<WaterReading>, StoreError> {
        let mut matching: Vec<WaterReading> = self
            .readings
            .iter()
            .filter(|r| r.household_id == household_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching.truncate(limit);
        Ok(matching)
    }
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryAlertStore {
    alerts: Vec<Alert>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }
}

impl AlertStore for MemoryAlertStore {
    fn insert_alert(&mut self, alert: &Alert) -> Result<(), StoreError> {
        if self.alerts.iter().any(|a| a.id == alert.id) {
            return Err(StoreError::Backend(format!(
                "duplicate alert id: {}",
                alert.id
            )));
        }
        self.alerts.push(alert.clone());
        Ok(())
    }

    fn get_alert(&mut self, id: &str) -> Result<Alert, StoreError> {
        self.alerts
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("alert {}", id)))
    }

    fn update_alert(&mut self, alert: &Alert) -> Result<(), StoreError> {
        match self.alerts.iter_mut().find(|a| a.id == alert.id) {
            Some(stored) => {
                *stored = alert.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("alert {}", alert.id))),
        }
    }

    fn list_alerts(&mut self, filter: &AlertFilter) -> Result<Vec<Alert>, StoreError> {
        let mut matching: Vec<Alert> = self
            .alerts
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching.truncate(filter.limit.unwrap_or(AlertFilter::DEFAULT_LIMIT));
        Ok(matching)
    }
}

// ---------------------------------------------------------------------------
// Recipients
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryRecipientStore {
    recipients: Vec<Recipient>,
}

impl MemoryRecipientStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The municipality's standing recipient list, seeded the way the
    /// production database is provisioned. `now` anchors the created_at
    /// timestamps.
    pub fn with_defaults(now: DateTime<Utc>) -> Self {
        let recipient = |id: &str,
                         name: &str,
                         email: &str,
                         phone: &str,
                         whatsapp: Option<&str>,
                         groups: Vec<RecipientGroup>,
                         active: bool,
                         created_days_ago: i64| Recipient {
            id: id.to_string(),
            name: name.to_string(),
            email: Some(email.to_string()),
            phone: Some(phone.to_string()),
            whatsapp: whatsapp.map(String::from),
            groups,
            active,
            created_at: now - Duration::days(created_days_ago),
            last_notified: None,
        };

        MemoryRecipientStore {
            recipients: vec![
                recipient(
                    "R001",
                    "Panchayat President",
                    "president@kandavara.gov.in",
                    "+91-9876543210",
                    Some("+91-9876543210"),
                    vec![RecipientGroup::Officials, RecipientGroup::Emergency],
                    true,
                    30,
                ),
                recipient(
                    "R002",
                    "Water Department Head",
                    "water@kandavara.gov.in",
                    "+91-9876543211",
                    Some("+91-9876543211"),
                    vec![RecipientGroup::Officials, RecipientGroup::Maintenance],
                    true,
                    25,
                ),
                recipient(
                    "R003",
                    "Field Engineer",
                    "field@kandavara.gov.in",
                    "+91-9876543212",
                    Some("+91-9876543212"),
                    vec![RecipientGroup::Maintenance, RecipientGroup::Emergency],
                    true,
                    20,
                ),
                recipient(
                    "R004",
                    "Emergency Response Team",
                    "emergency@kandavara.gov.in",
                    "+91-9876543213",
                    Some("+91-9876543213"),
                    vec![RecipientGroup::Emergency],
                    true,
                    15,
                ),
                recipient(
                    "R005",
                    "Resident Representative",
                    "residents@kandavara.gov.in",
                    "+91-9876543214",
                    Some("+91-9876543214"),
                    vec![RecipientGroup::Residents],
                    true,
                    10,
                ),
                // Ward members get email + SMS only, no WhatsApp.
                recipient(
                    "R006",
                    "Ward Member 1",
                    "ward1@kandavara.gov.in",
                    "+91-9876543215",
                    None,
                    vec![RecipientGroup::Officials, RecipientGroup::Residents],
                    true,
                    5,
                ),
                recipient(
                    "R007",
                    "Ward Member 2",
                    "ward2@kandavara.gov.in",
                    "+91-9876543216",
                    None,
                    vec![RecipientGroup::Officials, RecipientGroup::Residents],
                    false,
                    3,
                ),
            ],
        }
    }
}

impl RecipientStore for MemoryRecipientStore {
    fn add_recipient(&mut self, recipient: Recipient) -> Result<(), StoreError> {
        if self.recipients.iter().any(|r| r.id == recipient.id) {
            return Err(StoreError::Backend(format!(
                "duplicate recipient id: {}",
                recipient.id
            )));
        }
        self.recipients.push(recipient);
        Ok(())
    }

    fn list_recipients(&mut self, filter: &RecipientFilter) -> Result<Vec<Recipient>, StoreError> {
        let mut matching: Vec<Recipient> = self
            .recipients
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(limit) = filter.limit {
            matching.truncate(limit);
        }
        Ok(matching)
    }

    fn mark_notified(&mut self, id: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        match self.recipients.iter_mut().find(|r| r.id == id) {
            Some(recipient) => {
                recipient.last_notified = Some(at);
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("recipient {}", id))),
        }
    }

    fn group_counts(&mut self) -> Result<GroupCounts, StoreError> {
        let active = || self.recipients.iter().filter(|r| r.active);
        Ok(GroupCounts {
            officials: active().filter(|r| r.in_group(RecipientGroup::Officials)).count(),
            residents: active().filter(|r| r.in_group(RecipientGroup::Residents)).count(),
            maintenance: active().filter(|r| r.in_group(RecipientGroup::Maintenance)).count(),
            emergency: active().filter(|r| r.in_group(RecipientGroup::Emergency)).count(),
            total: active().count(),
        })
    }
}

// ---------------------------------------------------------------------------
// Broadcasts
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryBroadcastStore {
    broadcasts: Vec<BroadcastMessage>,
}

impl MemoryBroadcastStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BroadcastStore for MemoryBroadcastStore {
    fn append_broadcast(&mut self, broadcast: &BroadcastMessage) -> Result<(), StoreError> {
        self.broadcasts.push(broadcast.clone());
        Ok(())
    }

    fn recent_broadcasts(&mut self, limit: usize) -> Result<Vec<BroadcastMessage>, StoreError> {
        let mut recent: Vec<BroadcastMessage> = self.broadcasts.clone();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent.truncate(limit);
        Ok(recent)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AlertStatus, AnomalyType, ChannelKind, Severity};
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    fn alert(id: &str, household: &str, severity: Severity, minutes_ago: i64) -> Alert {
        Alert {
            id: id.to_string(),
            household_id: household.to_string(),
            anomaly_type: AnomalyType::Theft,
            severity,
            message: "Unusual spike detected: 90.0 L/min (200% of normal)".to_string(),
            timestamp: fixed_now() - Duration::minutes(minutes_ago),
            status: AlertStatus::Active,
            acknowledged_by: None,
            acknowledged_at: None,
            resolved_at: None,
            notifications_sent: vec![ChannelKind::Email],
        }
    }

    #[test]
    fn test_alert_insert_get_roundtrip() {
        let mut store = MemoryAlertStore::new();
        let a = alert("ALT000001", "H001", Severity::High, 5);
        store.insert_alert(&a).unwrap();
        assert_eq!(store.get_alert("ALT000001").unwrap(), a);
    }

    #[test]
    fn test_alert_duplicate_id_rejected() {
        let mut store = MemoryAlertStore::new();
        store.insert_alert(&alert("ALT000001", "H001", Severity::High, 5)).unwrap();
        assert!(store.insert_alert(&alert("ALT000001", "H002", Severity::Low, 1)).is_err());
    }

    #[test]
    fn test_alert_get_missing_is_not_found() {
        let mut store = MemoryAlertStore::new();
        assert!(matches!(
            store.get_alert("ALT999999"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_alert_update_replaces_stored_record() {
        let mut store = MemoryAlertStore::new();
        let mut a = alert("ALT000001", "H001", Severity::High, 5);
        store.insert_alert(&a).unwrap();

        a.status = AlertStatus::Acknowledged;
        a.acknowledged_by = Some("admin@kandavara.gov.in".to_string());
        store.update_alert(&a).unwrap();

        assert_eq!(store.get_alert("ALT000001").unwrap().status, AlertStatus::Acknowledged);
    }

    #[test]
    fn test_alert_list_is_newest_first_and_filtered() {
        let mut store = MemoryAlertStore::new();
        store.insert_alert(&alert("ALT000001", "H001", Severity::High, 30)).unwrap();
        store.insert_alert(&alert("ALT000002", "H002", Severity::Low, 10)).unwrap();
        store.insert_alert(&alert("ALT000003", "H001", Severity::Medium, 20)).unwrap();

        let all = store.list_alerts(&AlertFilter::default()).unwrap();
        assert_eq!(
            all.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(),
            vec!["ALT000002", "ALT000003", "ALT000001"],
            "newest first"
        );

        let h001 = store
            .list_alerts(&AlertFilter {
                household_id: Some("H001".to_string()),
                ..AlertFilter::default()
            })
            .unwrap();
        assert_eq!(h001.len(), 2);

        let high = store
            .list_alerts(&AlertFilter {
                severity: Some(Severity::High),
                ..AlertFilter::default()
            })
            .unwrap();
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].id, "ALT000001");
    }

    #[test]
    fn test_alert_list_respects_limit() {
        let mut store = MemoryAlertStore::new();
        for i in 0..10 {
            store.insert_alert(&alert(&format!("ALT{:06}", i), "H001", Severity::Low, i)).unwrap();
        }
        let limited = store
            .list_alerts(&AlertFilter {
                limit: Some(3),
                ..AlertFilter::default()
            })
            .unwrap();
        assert_eq!(limited.len(), 3);
    }

    #[test]
    fn test_reading_store_recent_is_per_household_newest_first() {
        use chrono::FixedOffset;
        let offset = FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap();
        let at = |minute: u32| offset.with_ymd_and_hms(2024, 1, 15, 10, minute, 0).unwrap();

        let mut store = MemoryReadingStore::new();
        store
            .insert_readings(&[
                WaterReading {
                    household_id: "H001".into(),
                    flow_rate_lpm: 40.0,
                    pressure_bar: 2.5,
                    timestamp: at(0),
                },
                WaterReading {
                    household_id: "H002".into(),
                    flow_rate_lpm: 38.0,
                    pressure_bar: 2.4,
                    timestamp: at(1),
                },
                WaterReading {
                    household_id: "H001".into(),
                    flow_rate_lpm: 44.0,
                    pressure_bar: 2.5,
                    timestamp: at(2),
                },
            ])
            .unwrap();

        let recent = store.recent_readings("H001", 10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].flow_rate_lpm, 44.0, "newest first");
    }

    #[test]
    fn test_default_recipients_active_counts() {
        let mut store = MemoryRecipientStore::with_defaults(fixed_now());
        let counts = store.group_counts().unwrap();
        // R007 is inactive, so 6 active in total; officials are R001,
        // R002, and Ward Member 1.
        assert_eq!(counts.total, 6);
        assert_eq!(counts.officials, 3);
        assert_eq!(counts.emergency, 3);
    }

    #[test]
    fn test_recipient_filter_by_group_and_active() {
        let mut store = MemoryRecipientStore::with_defaults(fixed_now());
        let officials = store
            .list_recipients(&RecipientFilter {
                group: Some(RecipientGroup::Officials),
                active: Some(true),
                limit: None,
            })
            .unwrap();
        assert_eq!(officials.len(), 3);
        // Sorted by name.
        assert_eq!(officials[0].name, "Panchayat President");
    }

    #[test]
    fn test_mark_notified_stamps_recipient() {
        let mut store = MemoryRecipientStore::with_defaults(fixed_now());
        store.mark_notified("R003", fixed_now()).unwrap();
        let all = store.list_recipients(&RecipientFilter::default()).unwrap();
        let r003 = all.iter().find(|r| r.id == "R003").unwrap();
        assert_eq!(r003.last_notified, Some(fixed_now()));
    }

    #[test]
    fn test_mark_notified_unknown_recipient_is_not_found() {
        let mut store = MemoryRecipientStore::with_defaults(fixed_now());
        assert!(matches!(
            store.mark_notified("R999", fixed_now()),
            Err(StoreError::NotFound(_))
        ));
    }
}
