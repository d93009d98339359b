//! Mutual exclusion oracle.
//!
//! Verifies that no resource ever has two holders at once.
//!
//! # Invariant
//!
//! `∀r, ∀t: |holders(r, t)| ≤ 1`
//!
//! # Usage
//!
//! ```ignore
//! let mut oracle = MutualExclusionOracle::new();
//!
//! oracle.on_acquired(worker, resource, seq);
//! oracle.on_released(worker, resource);
//!
//! oracle.check()?;
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::types::{ResourceId, WorkerId};

/// Two workers held the same resource at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionViolation {
    /// The doubly-held resource.
    pub resource: ResourceId,
    /// Worker that already held it.
    pub holder: WorkerId,
    /// Worker that acquired it anyway.
    pub intruder: WorkerId,
    /// Trace sequence number of the intruding acquisition.
    pub seq: u64,
}

impl fmt::Display for ExclusionViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} acquired {} at seq {} while {} held it",
            self.intruder, self.resource, self.seq, self.holder
        )
    }
}

impl std::error::Error for ExclusionViolation {}

/// Oracle for detecting simultaneous holders.
#[derive(Debug, Default)]
pub struct MutualExclusionOracle {
    /// Current holder of each resource.
    holders: HashMap<ResourceId, WorkerId>,
    /// Detected violations.
    violations: Vec<ExclusionViolation>,
}

impl MutualExclusionOracle {
    /// Creates a new oracle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `worker` now holds `resource`.
    pub fn on_acquired(&mut self, worker: WorkerId, resource: ResourceId, seq: u64) {
        if let Some(&holder) = self.holders.get(&resource) {
            self.violations.push(ExclusionViolation {
                resource,
                holder,
                intruder: worker,
                seq,
            });
        }
        self.holders.insert(resource, worker);
    }

    /// Records that `worker` gave `resource` back.
    pub fn on_released(&mut self, worker: WorkerId, resource: ResourceId) {
        if self.holders.get(&resource) == Some(&worker) {
            self.holders.remove(&resource);
        }
    }

    /// Returns the first violation, if any.
    pub fn check(&self) -> Result<(), ExclusionViolation> {
        if let Some(violation) = self.violations.first() {
            return Err(violation.clone());
        }
        Ok(())
    }

    /// Returns every violation.
    #[must_use]
    pub fn violations(&self) -> &[ExclusionViolation] {
        &self.violations
    }

    /// Resets the oracle to its initial state.
    pub fn reset(&mut self) {
        self.holders.clear();
        self.violations.clear();
    }
}
