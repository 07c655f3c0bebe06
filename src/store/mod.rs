/// Storage interfaces for the water-monitoring service.
///
/// Readings, alerts, recipients, and broadcast history all go through
/// these traits. The monitor loop and the alert manager only ever see the
/// trait, so tests run against the in-memory implementations and
/// production can point the same code at Postgres.
///
/// Submodules:
/// - `memory` — Vec-backed implementations (dev mode and tests).
/// - `sql` — Postgres-backed readings + alerts.

pub mod memory;
pub mod sql;

use chrono::{DateTime, Utc};

use crate::model::{
    Alert, AlertStatus, BroadcastMessage, Recipient, RecipientGroup, Severity, WaterReading,
};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum StoreError {
    /// The requested record does not exist.
    NotFound(String),
    /// The backing store failed (connection, constraint, I/O).
    Backend(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(what) => write!(f, "not found: {}", what),
            StoreError::Backend(msg) => write!(f, "storage backend error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

// ---------------------------------------------------------------------------
// Query filters
// ---------------------------------------------------------------------------

/// Filter for alert queries. All fields optional; `limit` defaults to 50.
/// Results come back newest first.
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub status: Option<AlertStatus>,
    pub household_id: Option<String>,
    pub severity: Option<Severity>,
    pub limit: Option<usize>,
}

impl AlertFilter {
    pub const DEFAULT_LIMIT: usize = 50;

    pub fn matches(&self, alert: &Alert) -> bool {
        if let Some(status) = self.status {
            if alert.status != status {
                return false;
            }
        }
        if let Some(ref household_id) = self.household_id {
            if &alert.household_id != household_id {
                return false;
            }
        }
        if let Some(severity) = self.severity {
            if alert.severity != severity {
                return false;
            }
        }
        true
    }
}

/// Filter for recipient queries. Results come back sorted by name.
#[derive(Debug, Clone, Default)]
pub struct RecipientFilter {
    pub group: Option<RecipientGroup>,
    pub active: Option<bool>,
    pub limit: Option<usize>,
}

impl RecipientFilter {
    /// Only active recipients, any group.
    pub fn active_only() -> Self {
        RecipientFilter {
            active: Some(true),
            ..RecipientFilter::default()
        }
    }

    pub fn matches(&self, recipient: &Recipient) -> bool {
        if let Some(group) = self.group {
            if !recipient.in_group(group) {
                return false;
            }
        }
        if let Some(active) = self.active {
            if recipient.active != active {
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Repository traits
// ---------------------------------------------------------------------------

/// Persistence for raw readings.
pub trait ReadingStore {
    /// Appends a batch, returning how many rows were written.
    fn insert_readings(&mut self, readings: &[WaterReading]) -> Result<usize, StoreError>;

    /// Latest readings for one household, newest first.
    fn recent_readings(
        &mut self,
        household_id: &str,
        limit: usize,
    ) -> Result<Vec<WaterReading>, StoreError>;
}

/// Persistence for alerts and their lifecycle updates.
pub trait AlertStore {
    fn insert_alert(&mut self, alert: &Alert) -> Result<(), StoreError>;

    fn get_alert(&mut self, id: &str) -> Result<Alert, StoreError>;

    /// Replaces the stored alert with the same id.
    fn update_alert(&mut self, alert: &Alert) -> Result<(), StoreError>;

    /// Filtered query, newest first, capped at the filter's limit.
    fn list_alerts(&mut self, filter: &AlertFilter) -> Result<Vec<Alert>, StoreError>;
}

/// Persistence for notification recipients.
pub trait RecipientStore {
    fn add_recipient(&mut self, recipient: Recipient) -> Result<(), StoreError>;

    /// Filtered query, sorted by name, capped at the filter's limit.
    fn list_recipients(&mut self, filter: &RecipientFilter) -> Result<Vec<Recipient>, StoreError>;

    /// Stamps `last_notified` after a delivery.
    fn mark_notified(&mut self, id: &str, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Active-recipient counts per group, for the dashboard.
    fn group_counts(&mut self) -> Result<GroupCounts, StoreError>;
}

/// Append-only history of sent broadcasts.
pub trait BroadcastStore {
    fn append_broadcast(&mut self, broadcast: &BroadcastMessage) -> Result<(), StoreError>;

    /// Most recent broadcasts, newest first.
    fn recent_broadcasts(&mut self, limit: usize) -> Result<Vec<BroadcastMessage>, StoreError>;
}

/// Active-recipient tallies per group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupCounts {
    pub officials: usize,
    pub residents: usize,
    pub maintenance: usize,
    pub emergency: usize,
    pub total: usize,
}
