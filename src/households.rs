/// Household registry for the municipal water-monitoring service.
///
/// Defines the canonical list of metered household connections along with
/// their historical baselines. This is the single source of truth for
/// household ids; other modules should reference connections from here
/// rather than hardcoding ids.
///
/// Baselines come from the utility's billing history (rolling 90-day
/// averages, refreshed out of band). A household that is not yet in the
/// registry classifies against [`DEFAULT_BASELINE`].

use crate::model::{Baseline, DEFAULT_BASELINE};

// ---------------------------------------------------------------------------
// Household metadata
// ---------------------------------------------------------------------------

/// Metadata for a single metered household connection.
pub struct Household {
    /// Opaque connection id, e.g. "H001".
    pub id: &'static str,
    /// Short label shown on the dashboard.
    pub name: &'static str,
    /// Where the connection sits on the distribution network.
    pub description: &'static str,
    /// Historical average flow and pressure for this connection.
    pub baseline: Baseline,
}

/// All metered households, ordered by connection id.
pub static HOUSEHOLD_REGISTRY: &[Household] = &[
    Household {
        id: "H001",
        name: "Ward 1 - Temple Street cluster",
        description: "First connection on the main line after the overhead \
                      tank. Pressure here tracks tank head closely.",
        baseline: Baseline {
            avg_flow_lpm: 45.0,
            avg_pressure_bar: 2.5,
        },
    },
    Household {
        id: "H002",
        name: "Ward 1 - School Road cluster",
        description: "Mid-line connection; smaller family, lowest typical \
                      draw in the network.",
        baseline: Baseline {
            avg_flow_lpm: 38.0,
            avg_pressure_bar: 2.4,
        },
    },
    Household {
        id: "H003",
        name: "Ward 2 - Market Square cluster",
        description: "Shared connection serving two buildings; highest \
                      typical draw, historically prone to unauthorised taps.",
        baseline: Baseline {
            avg_flow_lpm: 52.0,
            avg_pressure_bar: 2.6,
        },
    },
    Household {
        id: "H004",
        name: "Ward 2 - Canal Road cluster",
        description: "End-of-line connection; runs slightly below network \
                      pressure, so low-pressure findings here need the \
                      baseline-relative check rather than an absolute floor.",
        baseline: Baseline {
            avg_flow_lpm: 41.0,
            avg_pressure_bar: 2.3,
        },
    },
    Household {
        id: "H005",
        name: "Ward 3 - Panchayat Office cluster",
        description: "Branch-line connection next to the office; meter was \
                      recalibrated when the branch valve was replaced.",
        baseline: Baseline {
            avg_flow_lpm: 47.0,
            avg_pressure_bar: 2.5,
        },
    },
];

/// Returns the ids of all registered households, suitable for passing to
/// `ingest::gateway::build_readings_url` or the simulator.
pub fn all_household_ids() -> Vec<&'static str> {
    HOUSEHOLD_REGISTRY.iter().map(|h| h.id).collect()
}

/// Looks up a household by id. Returns `None` if not registered.
pub fn find_household(id: &str) -> Option<&'static Household> {
    HOUSEHOLD_REGISTRY.iter().find(|h| h.id == id)
}

/// Resolves the baseline for a household id, falling back to the
/// system-wide default for unregistered connections. Never fails.
pub fn baseline_for(id: &str) -> Baseline {
    find_household(id).map(|h| h.baseline).unwrap_or(DEFAULT_BASELINE)
}

// ---------------------------------------------------------------------------
// Baseline lookup capability
// ---------------------------------------------------------------------------

/// Injectable baseline lookup. The classifier's batch layer takes one of
/// these instead of reaching for the registry directly, so tests can swap
/// in fixed baselines.
pub trait BaselineProvider {
    fn baseline_for(&self, household_id: &str) -> Baseline;
}

/// Production provider backed by [`HOUSEHOLD_REGISTRY`].
pub struct RegistryBaselines;

impl BaselineProvider for RegistryBaselines {
    fn baseline_for(&self, household_id: &str) -> Baseline {
        baseline_for(household_id)
    }
}

/// Fixed-baseline provider for tests and what-if evaluation: every
/// household resolves to the same baseline.
pub struct FixedBaseline(pub Baseline);

impl BaselineProvider for FixedBaseline {
    fn baseline_for(&self, _household_id: &str) -> Baseline {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
