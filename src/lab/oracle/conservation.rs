//! Resource conservation oracle.
//!
//! Verifies that every acquisition is matched by exactly one release by the
//! same worker, and that nothing is still held at the end of a run.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::types::{ResourceId, WorkerId};

/// A lease was leaked or released by the wrong worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConservationViolation {
    /// `worker` released `resource` without holding it.
    UnheldRelease {
        /// Releasing worker.
        worker: WorkerId,
        /// Released resource.
        resource: ResourceId,
    },
    /// Acquisitions and releases of `resource` do not balance.
    Leak {
        /// Leaked resource.
        resource: ResourceId,
        /// Number of acquisitions.
        acquisitions: u64,
        /// Number of releases.
        releases: u64,
    },
}

impl fmt::Display for ConservationViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnheldRelease { worker, resource } => {
                write!(f, "{worker} released {resource} without holding it")
            }
            Self::Leak {
                resource,
                acquisitions,
                releases,
            } => write!(
                f,
                "{resource} leaked: {acquisitions} acquisitions, {releases} releases"
            ),
        }
    }
}

impl std::error::Error for ConservationViolation {}

#[derive(Debug, Default, Clone, Copy)]
struct Balance {
    acquisitions: u64,
    releases: u64,
}

/// Oracle for detecting leaked or foreign releases.
#[derive(Debug, Default)]
pub struct ConservationOracle {
    /// Per-resource counters, ordered for stable reporting.
    balances: BTreeMap<ResourceId, Balance>,
    /// Current holder of each resource.
    holders: HashMap<ResourceId, WorkerId>,
    /// Violations detected while events were fed.
    violations: Vec<ConservationViolation>,
}

impl ConservationOracle {
    /// Creates a new oracle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an acquisition.
    pub fn on_acquired(&mut self, worker: WorkerId, resource: ResourceId) {
        self.balances.entry(resource).or_default().acquisitions += 1;
        self.holders.insert(resource, worker);
    }

    /// Records a release.
    pub fn on_released(&mut self, worker: WorkerId, resource: ResourceId) {
        self.balances.entry(resource).or_default().releases += 1;
        if self.holders.get(&resource) == Some(&worker) {
            self.holders.remove(&resource);
        } else {
            self.violations
                .push(ConservationViolation::UnheldRelease { worker, resource });
        }
    }

    /// Returns the number of acquisitions and releases seen for `resource`.
    #[must_use]
    pub fn counts(&self, resource: ResourceId) -> (u64, u64) {
        self.balances
            .get(&resource)
            .map_or((0, 0), |b| (b.acquisitions, b.releases))
    }

    /// Verifies that the run ended with every lease returned.
    pub fn check(&self) -> Result<(), ConservationViolation> {
        if let Some(violation) = self.violations.first() {
            return Err(violation.clone());
        }
        for (&resource, balance) in &self.balances {
            if balance.acquisitions != balance.releases {
                return Err(ConservationViolation::Leak {
                    resource,
                    acquisitions: balance.acquisitions,
                    releases: balance.releases,
                });
            }
        }
        Ok(())
    }

    /// Resets the oracle to its initial state.
    pub fn reset(&mut self) {
        self.balances.clear();
        self.holders.clear();
        self.violations.clear();
    }
}
