/// Development-mode reading generator.
///
/// When the device gateway is unreachable or not configured, this module
/// produces realistic synthetic readings so the rest of the pipeline
/// (classification, alerting, notification) can run end to end. A small
/// fraction of samples carries an injected anomaly signature so the
/// dashboard has something to show.
///
/// # Clock injection
/// Generators take a `now: DateTime<FixedOffset>` parameter rather than
/// reading the wall clock, which keeps sample timestamps (and therefore
/// the leak detector's night window) controllable in tests.

use chrono::{DateTime, Duration, FixedOffset, Timelike};
use rand::Rng;

use crate::households::{all_household_ids, baseline_for};
use crate::model::WaterReading;

/// Fraction of samples that get an anomaly signature injected.
const ANOMALY_RATE: f64 = 0.1;

/// Configuration for synthetic reading generation.
pub struct Simulator {
    /// Trailing samples per household per cycle, spaced one minute apart.
    pub samples_per_household: usize,
    /// Probability in [0, 1] that a sample carries an anomaly signature.
    pub anomaly_rate: f64,
}

impl Default for Simulator {
    fn default() -> Self {
        Simulator {
            samples_per_household: 1,
            anomaly_rate: ANOMALY_RATE,
        }
    }
}

impl Simulator {
    pub fn new(samples_per_household: usize) -> Self {
        Simulator {
            samples_per_household,
            ..Simulator::default()
        }
    }

    /// Generates a series of readings for one household, ending at `now`
    /// and walking backwards in one-minute steps.
    pub fn readings_for(&self, household_id: &str, now: DateTime<FixedOffset>) -> Vec<WaterReading> {
        let base = baseline_for(household_id);
        let mut rng = rand::thread_rng();
        let mut readings = Vec::with_capacity(self.samples_per_household);

        for i in 0..self.samples_per_household {
            let age_minutes = (self.samples_per_household - 1 - i) as i64;
            let timestamp = now - Duration::minutes(age_minutes);

            // Ordinary jitter around the household's baseline.
            let mut flow = base.avg_flow_lpm + (rng.gen_range(0.0..1.0) - 0.5) * 20.0;
            let mut pressure = base.avg_pressure_bar + (rng.gen_range(0.0..1.0) - 0.5) * 0.8;

            if rng.gen_range(0.0..1.0) < self.anomaly_rate {
                let kind = rng.gen_range(0.0..1.0);
                if kind < 0.4 {
                    // Theft signature: well past 150% of normal.
                    flow = base.avg_flow_lpm * (1.5 + rng.gen_range(0.0..1.0) * 0.8);
                } else if kind < 0.7 {
                    // Leak signature: moderate continuous flow, only
                    // meaningful inside the night window.
                    if crate::analysis::classifier::is_night_hour(timestamp.hour()) {
                        flow = 8.0 + rng.gen_range(0.0..1.0) * 12.0;
                    }
                } else {
                    // Blockage signature: near-zero flow, sagging pressure.
                    flow = rng.gen_range(0.0..1.0) * 2.0;
                    pressure = base.avg_pressure_bar * (0.5 + rng.gen_range(0.0..1.0) * 0.3);
                }
            }

            readings.push(WaterReading {
                household_id: household_id.to_string(),
                flow_rate_lpm: flow.max(0.0),
                pressure_bar: pressure.max(0.0),
                timestamp,
            });
        }

        readings
    }

    /// Generates readings for every registered household.
    pub fn readings_for_all(&self, now: DateTime<FixedOffset>) -> Vec<WaterReading> {
        all_household_ids()
            .into_iter()
            .flat_map(|id| self.readings_for(id, now))
            .collect()
    }
}
