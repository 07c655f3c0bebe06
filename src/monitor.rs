//! Monitoring cycle orchestration.
//!
//! One cycle: validate the incoming batch (fail fast), classify every
//! reading, persist the raw readings, then for each actionable result
//! create an alert, persist it (retrying once; alert persistence is the
//! one write this pipeline treats as retryable), fan out notifications,
//! and record which channels delivered. Collaborator failures past
//! validation are logged and tallied, never fatal: a dead notification
//! gateway must not stop classification, and a full alert table must not
//! stop the next household's reading from being looked at.

use chrono::{DateTime, Utc};

use crate::alert::manager::alert_from_result;
use crate::alert::rules::{rule_for, AlertRule};
use crate::analysis::batch::classify_batch;
use crate::households::BaselineProvider;
use crate::logging;
use crate::model::{TelemetryError, WaterReading};
use crate::notify::dispatch::dispatch_alert;
use crate::notify::NotificationChannel;
use crate::store::{AlertStore, ReadingStore, RecipientStore};

/// What one cycle did, for the summary log line and the status endpoint.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleSummary {
    pub readings: usize,
    pub anomalies: usize,
    pub alerts_created: usize,
    pub notify_failures: usize,
    /// Alerts that could not be persisted even after the retry.
    pub alerts_dropped: usize,
}

/// Everything a cycle touches. Trait objects so dev mode, tests, and
/// production wire different implementations through the same loop.
pub struct Monitor<'a> {
    pub readings: &'a mut dyn ReadingStore,
    pub alerts: &'a mut dyn AlertStore,
    pub recipients: &'a mut dyn RecipientStore,
    pub channels: &'a [Box<dyn NotificationChannel>],
    pub rules: &'a [AlertRule],
}

impl Monitor<'_> {
    /// Runs one cycle over an already-fetched batch of readings.
    ///
    /// Returns `Err` only for invalid input (the batch is rejected as a
    /// whole); everything downstream degrades gracefully and is reported
    /// in the summary.
    pub fn run_cycle(
        &mut self,
        batch: &[WaterReading],
        baselines: &dyn BaselineProvider,
        now: DateTime<Utc>,
    ) -> Result<CycleSummary, TelemetryError> {
        let results = classify_batch(batch, baselines, false)?;

        let mut summary = CycleSummary {
            readings: batch.len(),
            ..CycleSummary::default()
        };

        if let Err(err) = self.readings.insert_readings(batch) {
            // Raw-sample history is best effort; classification already
            // happened and alerts still need to go out.
            logging::warn(
                logging::Component::Db,
                None,
                &format!("failed to persist {} readings: {}", batch.len(), err),
            );
        }

        for (sequence, result) in results.iter().filter(|r| r.is_anomaly()).enumerate() {
            summary.anomalies += 1;
            logging::info(
                logging::Component::Classifier,
                Some(&result.household_id),
                &format!(
                    "{} ({}, {:.0}% confidence): {}",
                    result.anomaly_type, result.severity, result.confidence, result.message
                ),
            );

            let Some(mut alert) = alert_from_result(result, now, sequence) else {
                continue;
            };

            let persisted = self.alerts.insert_alert(&alert).or_else(|first_err| {
                logging::warn(
                    logging::Component::Db,
                    Some(&alert.household_id),
                    &format!("alert insert failed, retrying once: {}", first_err),
                );
                self.alerts.insert_alert(&alert)
            });
            if let Err(err) = persisted {
                logging::error(
                    logging::Component::Db,
                    Some(&alert.household_id),
                    &format!("alert {} dropped after retry: {}", alert.id, err),
                );
                summary.alerts_dropped += 1;
                continue;
            }
            summary.alerts_created += 1;

            let Some(rule) = rule_for(self.rules, alert.anomaly_type) else {
                continue; // no enabled rule routes this anomaly type
            };

            match dispatch_alert(&alert, rule, self.recipients, self.channels, now) {
                Ok(outcome) => {
                    summary.notify_failures += outcome.failures;
                    if !outcome.channels_delivered.is_empty() {
                        alert.notifications_sent = outcome.channels_delivered;
                        if let Err(err) = self.alerts.update_alert(&alert) {
                            logging::warn(
                                logging::Component::Db,
                                Some(&alert.household_id),
                                &format!("failed to record notifications for {}: {}", alert.id, err),
                            );
                        }
                    }
                }
                Err(err) => {
                    logging::warn(
                        logging::Component::Notify,
                        Some(&alert.household_id),
                        &format!("dispatch for {} failed: {}", alert.id, err),
                    );
                }
            }
        }

        logging::log_cycle_summary(&summary);
        Ok(summary)
    }
}
