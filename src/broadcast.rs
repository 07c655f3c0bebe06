//! Group broadcasts.
//!
//! Alerts are automatic; broadcasts are manual: a supply-interruption
//! notice, a boil-water advisory. A broadcast targets recipient groups
//! rather than a rule, fans out over the requested channels, and records
//! its delivery tallies in the broadcast history.

use chrono::{DateTime, Utc};

use crate::logging;
use crate::model::{
    BroadcastMessage, BroadcastPriority, ChannelKind, DeliveryStatus, Recipient, TargetGroup,
};
use crate::notify::NotificationChannel;
use crate::store::{BroadcastStore, RecipientFilter, RecipientStore, StoreError};

/// What the operator submits from the dashboard.
#[derive(Debug, Clone)]
pub struct BroadcastRequest {
    pub title: String,
    pub message: String,
    pub priority: BroadcastPriority,
    pub channels: Vec<ChannelKind>,
    pub target_groups: Vec<TargetGroup>,
    pub sent_by: String,
}

/// Broadcast id: "BC" plus the last six digits of the epoch milliseconds.
pub fn next_broadcast_id(now: DateTime<Utc>) -> String {
    format!("BC{:06}", now.timestamp_millis().rem_euclid(1_000_000))
}

/// Active recipients matching any of the requested target groups.
pub fn resolve_targets(
    recipients: &mut dyn RecipientStore,
    target_groups: &[TargetGroup],
) -> Result<Vec<Recipient>, StoreError> {
    let active = recipients.list_recipients(&RecipientFilter::active_only())?;
    Ok(active
        .into_iter()
        .filter(|r| target_groups.iter().any(|g| g.includes(&r.groups)))
        .collect())
}

/// Sends a broadcast and records it in the history store.
///
/// Per-delivery failures are tallied, not fatal; a broadcast partially
/// delivered is still a sent broadcast with an honest `delivery` record.
pub fn send_broadcast(
    request: BroadcastRequest,
    recipients: &mut dyn RecipientStore,
    history: &mut dyn BroadcastStore,
    channels: &[Box<dyn NotificationChannel>],
    now: DateTime<Utc>,
) -> Result<BroadcastMessage, StoreError> {
    let targets = resolve_targets(recipients, &request.target_groups)?;
    let mut delivery = DeliveryStatus::default();

    for channel in channels {
        if !request.channels.contains(&channel.kind()) {
            continue;
        }

        for target in &targets {
            if target.address_for(channel.kind()).is_none() {
                continue;
            }

            delivery.sent += 1;
            match channel.send(target, &request.title, &request.message) {
                Ok(()) => {
                    delivery.delivered += 1;
                    recipients.mark_notified(&target.id, now)?;
                }
                Err(err) => {
                    delivery.failed += 1;
                    logging::log_notify_failure(channel.kind(), &target.id, &err);
                }
            }
        }
    }

    let broadcast = BroadcastMessage {
        id: next_broadcast_id(now),
        title: request.title,
        message: request.message,
        priority: request.priority,
        channels: request.channels,
        target_groups: request.target_groups,
        sent_by: request.sent_by,
        timestamp: now,
        recipient_count: targets.len(),
        delivery,
    };

    history.append_broadcast(&broadcast)?;
    Ok(broadcast)
}
