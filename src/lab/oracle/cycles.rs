//! Cycle count oracle.
//!
//! Verifies that every spawned worker completes exactly the configured number
//! of cycles, numbered 1, 2, ... in order, and then finishes.

use std::collections::BTreeMap;
use std::fmt;

use crate::types::WorkerId;

/// A worker did too much, too little, or skipped ahead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleViolation {
    /// Cycle numbers did not advance by one.
    OutOfSequence {
        /// Offending worker.
        worker: WorkerId,
        /// Cycle number expected next.
        expected: u32,
        /// Cycle number reported.
        actual: u32,
    },
    /// The worker finished with the wrong number of cycles.
    WrongCount {
        /// Offending worker.
        worker: WorkerId,
        /// Configured cycle count.
        expected: u32,
        /// Cycles completed.
        actual: u32,
    },
    /// The worker never reached `Done`.
    Unfinished {
        /// Offending worker.
        worker: WorkerId,
        /// Cycles completed so far.
        completed: u32,
    },
    /// The worker reported activity after finishing.
    AfterFinish {
        /// Offending worker.
        worker: WorkerId,
    },
}

impl fmt::Display for CycleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfSequence {
                worker,
                expected,
                actual,
            } => write!(f, "{worker} completed cycle {actual}, expected {expected}"),
            Self::WrongCount {
                worker,
                expected,
                actual,
            } => write!(f, "{worker} finished after {actual} cycles, expected {expected}"),
            Self::Unfinished { worker, completed } => {
                write!(f, "{worker} never finished ({completed} cycles completed)")
            }
            Self::AfterFinish { worker } => write!(f, "{worker} completed a cycle after finishing"),
        }
    }
}

impl std::error::Error for CycleViolation {}

#[derive(Debug, Default, Clone, Copy)]
struct Progress {
    completed: u32,
    finished: bool,
}

/// Oracle for checking per-worker cycle counts.
#[derive(Debug)]
pub struct CycleCountOracle {
    expected: u32,
    workers: BTreeMap<WorkerId, Progress>,
    violations: Vec<CycleViolation>,
}

impl CycleCountOracle {
    /// Creates an oracle expecting `expected` cycles per worker.
    #[must_use]
    pub fn new(expected: u32) -> Self {
        Self {
            expected,
            workers: BTreeMap::new(),
            violations: Vec::new(),
        }
    }

    /// Records a worker start.
    pub fn on_spawn(&mut self, worker: WorkerId) {
        self.workers.entry(worker).or_default();
    }

    /// Records a completed cycle.
    pub fn on_cycle_complete(&mut self, worker: WorkerId, cycle: u32) {
        let progress = self.workers.entry(worker).or_default();
        if progress.finished {
            self.violations.push(CycleViolation::AfterFinish { worker });
            return;
        }
        let expected = progress.completed + 1;
        if cycle != expected {
            self.violations.push(CycleViolation::OutOfSequence {
                worker,
                expected,
                actual: cycle,
            });
        }
        progress.completed += 1;
    }

    /// Records a worker reaching `Done`.
    pub fn on_finished(&mut self, worker: WorkerId) {
        let progress = self.workers.entry(worker).or_default();
        progress.finished = true;
        if progress.completed != self.expected {
            self.violations.push(CycleViolation::WrongCount {
                worker,
                expected: self.expected,
                actual: progress.completed,
            });
        }
    }

    /// Returns the number of cycles `worker` has completed.
    #[must_use]
    pub fn completed(&self, worker: WorkerId) -> u32 {
        self.workers.get(&worker).map_or(0, |p| p.completed)
    }

    /// Verifies every known worker finished with the expected count.
    pub fn check(&self) -> Result<(), CycleViolation> {
        if let Some(violation) = self.violations.first() {
            return Err(violation.clone());
        }
        for (&worker, progress) in &self.workers {
            if !progress.finished {
                return Err(CycleViolation::Unfinished {
                    worker,
                    completed: progress.completed,
                });
            }
        }
        Ok(())
    }

    /// Resets the oracle, keeping the expected count.
    pub fn reset(&mut self) {
        self.workers.clear();
        self.violations.clear();
    }
}
