/// Core data types for the household water-monitoring service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no logic, no I/O, and no external collaborators — only types,
/// their serde/Display glue, and the documented default baseline.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Baseline
// ---------------------------------------------------------------------------

/// Per-household reference statistics used as the normal-usage anchor.
///
/// Both averages are strictly positive for every registered household.
/// Unknown households resolve to [`DEFAULT_BASELINE`], a documented
/// fallback, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    /// Typical flow rate, liters per minute.
    pub avg_flow_lpm: f64,
    /// Typical line pressure, bar.
    pub avg_pressure_bar: f64,
}

/// System-wide baseline substituted when a household id is not in the
/// registry. New connections classify against this until they accumulate
/// history of their own.
pub const DEFAULT_BASELINE: Baseline = Baseline {
    avg_flow_lpm: 45.0,
    avg_pressure_bar: 2.5,
};

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// One sample of sensed state for a household.
///
/// Produced by the device gateway (or the dev-mode simulator), consumed
/// once by the classifier. The timestamp keeps the offset reported by the
/// meter so hour-of-day checks run in the household's local time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterReading {
    pub household_id: String,
    /// Non-negative, liters per minute.
    pub flow_rate_lpm: f64,
    /// Non-negative, bar.
    pub pressure_bar: f64,
    pub timestamp: DateTime<FixedOffset>,
}

// ---------------------------------------------------------------------------
// Classification types
// ---------------------------------------------------------------------------

/// What a reading was classified as. `None` is the normal-usage outcome,
/// not an absence of an answer; every reading gets exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyType {
    Theft,
    Leak,
    Blockage,
    None,
}

impl AnomalyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyType::Theft => "theft",
            AnomalyType::Leak => "leak",
            AnomalyType::Blockage => "blockage",
            AnomalyType::None => "none",
        }
    }
}

impl std::fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AnomalyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "theft" => Ok(AnomalyType::Theft),
            "leak" => Ok(AnomalyType::Leak),
            "blockage" => Ok(AnomalyType::Blockage),
            "none" => Ok(AnomalyType::None),
            other => Err(format!("unknown anomaly type: {}", other)),
        }
    }
}

/// Severity levels in ascending order. The derived `Ord` gives the ranking
/// low < medium < high used to pick among multiple firing detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    /// Numeric rank used by alert prioritisation: high 3 > medium 2 > low 1.
    pub fn score(&self) -> u8 {
        match self {
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            other => Err(format!("unknown severity: {}", other)),
        }
    }
}

/// Classifier output. Created fresh per reading, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyResult {
    pub household_id: String,
    pub anomaly_type: AnomalyType,
    /// `Low` (a meaningless default) when `anomaly_type` is `None`.
    pub severity: Severity,
    /// Percentage in [0, 100].
    pub confidence: f64,
    /// Human-readable explanation. Format-sensitive: dashboards and
    /// notification templates key off the leading phrase.
    pub message: String,
    /// Copied from the input reading.
    pub timestamp: DateTime<FixedOffset>,
}

impl AnomalyResult {
    /// Consumers filtering for actionable results check exactly this.
    pub fn is_anomaly(&self) -> bool {
        self.anomaly_type != AnomalyType::None
    }
}

// ---------------------------------------------------------------------------
// Alert types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Acknowledged => "acknowledged",
            AlertStatus::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlertStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AlertStatus::Active),
            "acknowledged" => Ok(AlertStatus::Acknowledged),
            "resolved" => Ok(AlertStatus::Resolved),
            other => Err(format!("unknown alert status: {}", other)),
        }
    }
}

/// A recorded anomaly with its notification and acknowledgement trail.
///
/// `anomaly_type` is never `None` here; normal readings do not produce
/// alerts; `alert::manager::alert_from_result` enforces that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub household_id: String,
    pub anomaly_type: AnomalyType,
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub status: AlertStatus,
    pub acknowledged_by: Option<String>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    /// Channel kinds that delivered to at least one recipient.
    pub notifications_sent: Vec<ChannelKind>,
}

// ---------------------------------------------------------------------------
// Notification types
// ---------------------------------------------------------------------------

/// Notification transports the service can route through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Email,
    Sms,
    Whatsapp,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Email => "email",
            ChannelKind::Sms => "sms",
            ChannelKind::Whatsapp => "whatsapp",
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recipient groups used for alert routing and broadcast targeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientGroup {
    Officials,
    Residents,
    Maintenance,
    Emergency,
}

/// Someone notifications can be delivered to. Contact fields are optional;
/// a recipient without, say, a WhatsApp number is silently skipped when an
/// alert routes through that channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub groups: Vec<RecipientGroup>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_notified: Option<DateTime<Utc>>,
}

impl Recipient {
    /// The address this recipient can be reached at over `kind`, if any.
    pub fn address_for(&self, kind: ChannelKind) -> Option<&str> {
        match kind {
            ChannelKind::Email => self.email.as_deref(),
            ChannelKind::Sms => self.phone.as_deref(),
            ChannelKind::Whatsapp => self.whatsapp.as_deref(),
        }
    }

    pub fn in_group(&self, group: RecipientGroup) -> bool {
        self.groups.contains(&group)
    }
}

// ---------------------------------------------------------------------------
// Broadcast types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastPriority {
    Low,
    Medium,
    High,
    Emergency,
}

/// Broadcast targeting. `All` expands to every active recipient regardless
/// of group membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetGroup {
    All,
    Officials,
    Residents,
    Maintenance,
    Emergency,
}

impl TargetGroup {
    /// Whether a recipient with these group memberships is targeted.
    pub fn includes(&self, groups: &[RecipientGroup]) -> bool {
        match self {
            TargetGroup::All => true,
            TargetGroup::Officials => groups.contains(&RecipientGroup::Officials),
            TargetGroup::Residents => groups.contains(&RecipientGroup::Residents),
            TargetGroup::Maintenance => groups.contains(&RecipientGroup::Maintenance),
            TargetGroup::Emergency => groups.contains(&RecipientGroup::Emergency),
        }
    }
}

/// Per-broadcast delivery tallies across all channels and recipients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStatus {
    /// Send attempts made.
    pub sent: usize,
    /// Attempts the transport accepted.
    pub delivered: usize,
    /// Attempts that errored.
    pub failed: usize,
}

/// A manual announcement sent to one or more recipient groups, recorded
/// with its delivery outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastMessage {
    pub id: String,
    pub title: String,
    pub message: String,
    pub priority: BroadcastPriority,
    pub channels: Vec<ChannelKind>,
    pub target_groups: Vec<TargetGroup>,
    pub sent_by: String,
    pub timestamp: DateTime<Utc>,
    pub recipient_count: usize,
    pub delivery: DeliveryStatus,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when obtaining or validating telemetry.
#[derive(Debug, PartialEq)]
pub enum TelemetryError {
    /// Non-2xx HTTP response from the device gateway.
    HttpError(u16),
    /// The response body could not be deserialized.
    ParseError(String),
    /// A submitted reading failed boundary validation. Fails the whole
    /// batch fast rather than silently skipping the bad element.
    InvalidReading { household_id: String, reason: String },
    /// The gateway answered but carried no usable samples.
    NoData(String),
}

impl std::fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TelemetryError::HttpError(code) => write!(f, "HTTP error: {}", code),
            TelemetryError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            TelemetryError::InvalidReading { household_id, reason } => {
                write!(f, "Invalid reading for household {}: {}", household_id, reason)
            }
            TelemetryError::NoData(context) => write!(f, "No data available: {}", context),
        }
    }
}

impl std::error::Error for TelemetryError {}
