//! Trace oracles for the protocol's invariants.
//!
//! Each oracle is fed events and answers `check()`:
//!
//! - [`MutualExclusionOracle`]: no resource has two holders at once
//! - [`AcquisitionOrderOracle`]: kind A before kind B, nothing held across a check
//! - [`ConservationOracle`]: every acquisition is released by its holder
//! - [`CycleCountOracle`]: every worker completes exactly the configured cycles
//!
//! [`OracleSuite`] replays a whole [`Trace`](crate::trace::Trace) through all
//! four.

pub mod conservation;
pub mod cycles;
pub mod exclusion;
pub mod ordering;

pub use conservation::{ConservationOracle, ConservationViolation};
pub use cycles::{CycleCountOracle, CycleViolation};
pub use exclusion::{ExclusionViolation, MutualExclusionOracle};
pub use ordering::{AcquisitionOrderOracle, OrderViolation, OrderViolationKind};

use thiserror::Error;

use crate::trace::{TraceEvent, TraceEventKind};

/// A violation reported by any oracle in the suite.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleViolation {
    /// Mutual exclusion was broken.
    #[error(transparent)]
    Exclusion(#[from] ExclusionViolation),
    /// Acquisition order was broken.
    #[error(transparent)]
    Order(#[from] OrderViolation),
    /// A lease leaked or was released by a non-holder.
    #[error(transparent)]
    Conservation(#[from] ConservationViolation),
    /// A worker's cycle count was wrong.
    #[error(transparent)]
    Cycles(#[from] CycleViolation),
}

/// All protocol oracles, fed from one event stream.
#[derive(Debug)]
pub struct OracleSuite {
    /// Mutual exclusion.
    pub exclusion: MutualExclusionOracle,
    /// Acquisition order.
    pub order: AcquisitionOrderOracle,
    /// Lease conservation.
    pub conservation: ConservationOracle,
    /// Cycle counts.
    pub cycles: CycleCountOracle,
}

impl OracleSuite {
    /// Creates a suite expecting `expected_cycles` per worker.
    #[must_use]
    pub fn new(expected_cycles: u32) -> Self {
        Self {
            exclusion: MutualExclusionOracle::new(),
            order: AcquisitionOrderOracle::new(),
            conservation: ConservationOracle::new(),
            cycles: CycleCountOracle::new(expected_cycles),
        }
    }

    /// Creates a suite and feeds it `events` in order.
    #[must_use]
    pub fn replay(events: &[TraceEvent], expected_cycles: u32) -> Self {
        let mut suite = Self::new(expected_cycles);
        for event in events {
            suite.observe(event);
        }
        suite
    }

    /// Feeds one event to every oracle that cares about it.
    pub fn observe(&mut self, event: &TraceEvent) {
        let worker = event.worker;
        match event.kind {
            TraceEventKind::Spawned => self.cycles.on_spawn(worker),
            TraceEventKind::Waiting { .. } => {}
            TraceEventKind::Acquired { resource, .. } => {
                self.exclusion.on_acquired(worker, resource, event.seq);
                self.order.on_acquired(worker, resource);
                self.conservation.on_acquired(worker, resource);
            }
            TraceEventKind::Released { resource } => {
                self.exclusion.on_released(worker, resource);
                self.order.on_released(worker, resource);
                self.conservation.on_released(worker, resource);
            }
            TraceEventKind::CycleComplete { cycle } => {
                self.order.on_cycle_complete(worker);
                self.cycles.on_cycle_complete(worker, cycle);
            }
            TraceEventKind::Finished => self.cycles.on_finished(worker),
        }
    }

    /// Runs every oracle and collects the first violation of each.
    pub fn check_all(&self) -> Result<(), Vec<OracleViolation>> {
        let violations: Vec<OracleViolation> = [
            self.exclusion.check().err().map(OracleViolation::from),
            self.order.check().err().map(OracleViolation::from),
            self.conservation.check().err().map(OracleViolation::from),
            self.cycles.check().err().map(OracleViolation::from),
        ]
        .into_iter()
        .flatten()
        .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Resets every oracle.
    pub fn reset(&mut self) {
        self.exclusion.reset();
        self.order.reset();
        self.conservation.reset();
        self.cycles.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::Trace;
    use crate::types::{ResourceId, WorkerId};

    fn init_test(name: &str) {
        crate::test_utils::init_test_logging();
        crate::test_phase!(name);
    }

    fn record_cycle(trace: &Trace, worker: WorkerId, a: ResourceId, b: ResourceId, cycle: u32) {
        trace.record(worker, TraceEventKind::Acquired { resource: a, contended: false });
        trace.record(worker, TraceEventKind::Acquired { resource: b, contended: false });
        trace.record(worker, TraceEventKind::Released { resource: b });
        trace.record(worker, TraceEventKind::Released { resource: a });
        trace.record(worker, TraceEventKind::CycleComplete { cycle });
    }

    #[test]
    fn clean_trace_passes_every_oracle() {
        init_test("clean_trace_passes_every_oracle");
        let trace = Trace::new();
        let (w0, w1) = (WorkerId::new(0), WorkerId::new(1));
        trace.record(w0, TraceEventKind::Spawned);
        trace.record(w1, TraceEventKind::Spawned);
        for cycle in 1..=2 {
            record_cycle(&trace, w0, ResourceId::a(0), ResourceId::b(0), cycle);
            record_cycle(&trace, w1, ResourceId::a(0), ResourceId::b(0), cycle);
        }
        trace.record(w0, TraceEventKind::Finished);
        trace.record(w1, TraceEventKind::Finished);

        let suite = OracleSuite::replay(&trace.events(), 2);
        let ok = suite.check_all().is_ok();
        crate::assert_with_log!(ok, "ok", true, ok);
        crate::test_complete!("clean_trace_passes_every_oracle");
    }

    #[test]
    fn overlapping_trace_reports_each_broken_invariant() {
        init_test("overlapping_trace_reports_each_broken_invariant");
        let trace = Trace::new();
        let (w0, w1) = (WorkerId::new(0), WorkerId::new(1));
        trace.record(w0, TraceEventKind::Spawned);
        trace.record(w1, TraceEventKind::Spawned);
        trace.record(w0, TraceEventKind::Acquired { resource: ResourceId::a(0), contended: false });
        trace.record(w1, TraceEventKind::Acquired { resource: ResourceId::a(0), contended: false });
        trace.record(w1, TraceEventKind::Finished);

        let suite = OracleSuite::replay(&trace.events(), 1);
        let violations = suite.check_all().expect_err("broken trace");
        let has_exclusion = violations
            .iter()
            .any(|v| matches!(v, OracleViolation::Exclusion(_)));
        let has_leak = violations
            .iter()
            .any(|v| matches!(v, OracleViolation::Conservation(_)));
        let has_cycles = violations
            .iter()
            .any(|v| matches!(v, OracleViolation::Cycles(_)));
        crate::assert_with_log!(has_exclusion, "exclusion", true, has_exclusion);
        crate::assert_with_log!(has_leak, "conservation", true, has_leak);
        crate::assert_with_log!(has_cycles, "cycles", true, has_cycles);
        crate::test_complete!("overlapping_trace_reports_each_broken_invariant");
    }

    #[test]
    fn reset_clears_every_oracle() {
        init_test("reset_clears_every_oracle");
        let mut suite = OracleSuite::new(1);
        suite.observe(&TraceEvent {
            seq: 0,
            at: std::time::Duration::ZERO,
            worker: WorkerId::new(0),
            kind: TraceEventKind::Acquired {
                resource: ResourceId::b(0),
                contended: false,
            },
        });
        let err = suite.check_all().is_err();
        crate::assert_with_log!(err, "err", true, err);

        suite.reset();
        let ok = suite.check_all().is_ok();
        crate::assert_with_log!(ok, "ok after reset", true, ok);
        crate::test_complete!("reset_clears_every_oracle");
    }
}
