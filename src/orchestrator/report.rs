//! Outcome of a finished run.

use std::time::Duration;

use serde::Serialize;

use crate::assignment::AssignmentTable;
use crate::lab::{OracleSuite, OracleViolation};
use crate::sync::ResourceSnapshot;
use crate::trace::TraceEvent;
use crate::types::{ResourceId, WorkerId};
use crate::worker::WorkerSummary;

/// Everything observable about a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Seed that drove the simulated durations.
    pub seed: u64,
    /// Configured cycles per worker.
    pub cycles: u32,
    /// Wall time from spawn to the last join.
    pub elapsed: Duration,
    /// The assignment the workers ran with.
    pub table: AssignmentTable,
    /// One summary per worker, in worker order.
    pub workers: Vec<WorkerSummary>,
    /// Resource counters, kind A first, each kind in index order.
    pub resources: Vec<ResourceSnapshot>,
    /// Every recorded event, in sequence order.
    pub trace: Vec<TraceEvent>,
}

impl RunReport {
    /// Replays the trace through every protocol oracle.
    pub fn verify(&self) -> Result<(), Vec<OracleViolation>> {
        OracleSuite::replay(&self.trace, self.cycles).check_all()
    }

    /// Returns true if every resource ended available with balanced counters.
    #[must_use]
    pub fn is_quiescent(&self) -> bool {
        self.resources.iter().all(ResourceSnapshot::is_balanced)
    }

    /// Returns the summary of `worker`.
    #[must_use]
    pub fn worker(&self, worker: WorkerId) -> Option<&WorkerSummary> {
        self.workers.iter().find(|w| w.id == worker)
    }

    /// Returns the counters of `resource`.
    #[must_use]
    pub fn resource(&self, resource: ResourceId) -> Option<&ResourceSnapshot> {
        self.resources.iter().find(|r| r.id == resource)
    }

    /// Returns the number of acquisitions that had to wait, across all workers.
    #[must_use]
    pub fn total_contended(&self) -> u64 {
        self.workers
            .iter()
            .map(|w| u64::from(w.contended_acquisitions))
            .sum()
    }
}
