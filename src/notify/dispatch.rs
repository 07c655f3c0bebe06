//! Alert notification fan-out.
//!
//! Given a freshly created alert and its routing rule, dispatch selects
//! the active recipients in the rule's groups, sends over each enabled
//! channel, and reports which channel kinds reached at least one
//! recipient. Delivery failures are logged and skipped: a dead SMS
//! gateway must not stop the email from going out, and no notification
//! failure ever aborts the classification/alerting pipeline.

use chrono::{DateTime, Utc};

use crate::alert::rules::AlertRule;
use crate::logging;
use crate::model::{Alert, ChannelKind, Recipient};
use crate::notify::NotificationChannel;
use crate::store::{RecipientFilter, RecipientStore, StoreError};

/// Outcome of one alert's fan-out.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Channel kinds that delivered to at least one recipient.
    pub channels_delivered: Vec<ChannelKind>,
    pub deliveries: usize,
    pub failures: usize,
}

/// Recipients an alert under `rule` should reach: active, and a member of
/// at least one of the rule's groups.
pub fn recipients_for_rule(
    store: &mut dyn RecipientStore,
    rule: &AlertRule,
) -> Result<Vec<Recipient>, StoreError> {
    let active = store.list_recipients(&RecipientFilter::active_only())?;
    Ok(active
        .into_iter()
        .filter(|r| rule.recipient_groups.iter().any(|g| r.in_group(*g)))
        .collect())
}

/// Fans one alert out over the rule's channels.
///
/// Recipients without an address for a channel are skipped without an
/// attempt; actual send failures are logged per recipient and counted.
/// Successfully reached recipients get their `last_notified` stamped.
pub fn dispatch_alert(
    alert: &Alert,
    rule: &AlertRule,
    recipients: &mut dyn RecipientStore,
    channels: &[Box<dyn NotificationChannel>],
    now: DateTime<Utc>,
) -> Result<DispatchOutcome, StoreError> {
    let targets = recipients_for_rule(recipients, rule)?;
    let subject = format!(
        "[{}] {} alert for {}",
        alert.severity, alert.anomaly_type, alert.household_id
    );

    let mut outcome = DispatchOutcome::default();

    for channel in channels {
        if !rule.channels.contains(&channel.kind()) {
            continue;
        }

        let mut delivered_any = false;
        for recipient in &targets {
            if recipient.address_for(channel.kind()).is_none() {
                continue;
            }

            match channel.send(recipient, &subject, &alert.message) {
                Ok(()) => {
                    delivered_any = true;
                    outcome.deliveries += 1;
                    recipients.mark_notified(&recipient.id, now)?;
                }
                Err(err) => {
                    outcome.failures += 1;
                    logging::log_notify_failure(channel.kind(), &recipient.id, &err);
                }
            }
        }

        if delivered_any {
            outcome.channels_delivered.push(channel.kind());
        }
    }

    Ok(outcome)
}
