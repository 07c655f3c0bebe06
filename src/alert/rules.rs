//! Alert routing rules.
//!
//! One rule per anomaly type decides which channels an alert fans out on,
//! which recipient groups hear about it, and whether an unacknowledged
//! alert escalates. This is configuration, not detection: the classifier's
//! thresholds are constants of the classifier and are not duplicated here.

use crate::model::{AnomalyType, ChannelKind, RecipientGroup};

/// Escalation policy for alerts nobody acknowledges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationPolicy {
    pub enabled: bool,
    /// Minutes an alert may stay active before it escalates.
    pub time_minutes: u64,
    pub escalate_to_supervisor: bool,
}

/// Routing rule for one anomaly type.
#[derive(Debug, Clone)]
pub struct AlertRule {
    pub id: &'static str,
    pub name: &'static str,
    pub anomaly_type: AnomalyType,
    pub enabled: bool,
    /// Channels this rule fans out on.
    pub channels: &'static [ChannelKind],
    /// Groups whose active recipients are notified.
    pub recipient_groups: &'static [RecipientGroup],
    pub escalation: EscalationPolicy,
}

/// The standing rule set, mirroring how the utility routes each anomaly
/// type today. Theft goes to officials fast, leaks to maintenance at
/// leisure, blockages to whoever can physically reach a valve.
pub static DEFAULT_RULES: &[AlertRule] = &[
    AlertRule {
        id: "RULE001",
        name: "Water Theft Detection",
        anomaly_type: AnomalyType::Theft,
        enabled: true,
        channels: &[ChannelKind::Email, ChannelKind::Sms],
        recipient_groups: &[RecipientGroup::Officials],
        escalation: EscalationPolicy {
            enabled: true,
            time_minutes: 30,
            escalate_to_supervisor: true,
        },
    },
    AlertRule {
        id: "RULE002",
        name: "Leak Detection",
        anomaly_type: AnomalyType::Leak,
        enabled: true,
        channels: &[ChannelKind::Email, ChannelKind::Whatsapp],
        recipient_groups: &[RecipientGroup::Maintenance],
        escalation: EscalationPolicy {
            enabled: false,
            time_minutes: 60,
            escalate_to_supervisor: false,
        },
    },
    AlertRule {
        id: "RULE003",
        name: "Valve Blockage Detection",
        anomaly_type: AnomalyType::Blockage,
        enabled: true,
        channels: &[ChannelKind::Email, ChannelKind::Sms, ChannelKind::Whatsapp],
        recipient_groups: &[RecipientGroup::Maintenance, RecipientGroup::Emergency],
        escalation: EscalationPolicy {
            enabled: true,
            time_minutes: 15,
            escalate_to_supervisor: true,
        },
    },
];

/// First enabled rule for an anomaly type, if any. `AnomalyType::None`
/// never matches a rule; normal readings don't route anywhere.
pub fn rule_for(rules: &[AlertRule], anomaly_type: AnomalyType) -> Option<&AlertRule> {
    rules
        .iter()
        .find(|r| r.enabled && r.anomaly_type == anomaly_type)
}
