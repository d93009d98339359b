//! Workers and their lifecycle.
//!
//! A [`Worker`] is bound to one kind-A and one kind-B [`Resource`] for its
//! whole life. Each cycle it acquires A, then B, uses both for a random
//! duration, releases both, and checks its work for a random duration while
//! holding nothing. After the configured number of cycles it reaches
//! [`WorkerState::Done`] and stops.
//!
//! Acquiring A strictly before B in every worker is what keeps the model
//! deadlock-free: a worker holding a kind-B resource never waits, so no wait
//! chain can close into a cycle.

pub mod state;

pub use state::WorkerState;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::{Bounds, TimingProfile};
use crate::sync::Resource;
use crate::trace::{Trace, TraceEventKind};
use crate::types::{ResourceId, ResourceKind, WorkerId};
use crate::util::DetRng;

/// Everything needed to construct a worker.
#[derive(Debug, Clone)]
pub struct WorkerSpec {
    /// Worker identity.
    pub id: WorkerId,
    /// Bound kind-A resource.
    pub resource_a: Arc<Resource>,
    /// Bound kind-B resource.
    pub resource_b: Arc<Resource>,
    /// Simulated step durations.
    pub timing: TimingProfile,
    /// Cycles to perform.
    pub cycles: u32,
}

/// What a worker did over its life.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerSummary {
    /// Worker identity.
    pub id: WorkerId,
    /// Bound kind-A resource.
    pub resource_a: ResourceId,
    /// Bound kind-B resource.
    pub resource_b: ResourceId,
    /// Cycles fully completed.
    pub cycles_completed: u32,
    /// State when the summary was taken.
    pub final_state: WorkerState,
    /// Acquisitions that found the resource held.
    pub contended_acquisitions: u32,
    /// Total time spent blocked on resources.
    pub total_wait: Duration,
}

/// A worker driving the acquire, use, release, check cycle.
#[derive(Debug)]
pub struct Worker {
    id: WorkerId,
    resource_a: Arc<Resource>,
    resource_b: Arc<Resource>,
    timing: TimingProfile,
    cycles_total: u32,
    cycles_remaining: u32,
    state: WorkerState,
    rng: DetRng,
    trace: Arc<Trace>,
    contended: u32,
    total_wait: Duration,
}

impl Worker {
    /// Creates an idle worker.
    ///
    /// # Panics
    ///
    /// Panics if `spec.resource_a` is not kind A or `spec.resource_b` is not
    /// kind B.
    #[must_use]
    pub fn new(spec: WorkerSpec, rng: DetRng, trace: Arc<Trace>) -> Self {
        assert_eq!(
            spec.resource_a.kind(),
            ResourceKind::A,
            "{} bound to {} as its kind-A resource",
            spec.id,
            spec.resource_a.id()
        );
        assert_eq!(
            spec.resource_b.kind(),
            ResourceKind::B,
            "{} bound to {} as its kind-B resource",
            spec.id,
            spec.resource_b.id()
        );
        Self {
            id: spec.id,
            resource_a: spec.resource_a,
            resource_b: spec.resource_b,
            timing: spec.timing,
            cycles_total: spec.cycles,
            cycles_remaining: spec.cycles,
            state: WorkerState::Idle,
            rng,
            trace,
            contended: 0,
            total_wait: Duration::ZERO,
        }
    }

    /// Returns the worker's identity.
    #[must_use]
    pub const fn id(&self) -> WorkerId {
        self.id
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> WorkerState {
        self.state
    }

    /// Returns the cycles still to perform.
    #[must_use]
    pub const fn cycles_remaining(&self) -> u32 {
        self.cycles_remaining
    }

    /// Returns the cycles already completed.
    #[must_use]
    pub const fn cycles_completed(&self) -> u32 {
        self.cycles_total - self.cycles_remaining
    }

    /// Performs the current state's action and moves to the next state.
    ///
    /// Blocks while acquiring and while sleeping through the use and check
    /// steps. Calling `step` on a finished worker does nothing.
    pub fn step(&mut self) -> WorkerState {
        let next = match self.state {
            WorkerState::Idle => {
                self.trace.record(self.id, TraceEventKind::Spawned);
                tracing::info!(
                    worker = %self.id,
                    a = %self.resource_a.id(),
                    b = %self.resource_b.id(),
                    cycles = self.cycles_total,
                    "worker spawned"
                );
                if self.cycles_remaining == 0 {
                    self.finish()
                } else {
                    WorkerState::AcquiringA
                }
            }
            WorkerState::AcquiringA => {
                self.take(ResourceKind::A);
                WorkerState::AcquiringB
            }
            WorkerState::AcquiringB => {
                self.take(ResourceKind::B);
                WorkerState::Using
            }
            WorkerState::Using => {
                let pause = self.draw(self.timing.use_ms);
                tracing::debug!(worker = %self.id, ms = pause.as_millis() as u64, "using resources");
                pause_for(pause);
                WorkerState::Releasing
            }
            WorkerState::Releasing => {
                self.give_back(ResourceKind::B);
                self.give_back(ResourceKind::A);
                WorkerState::Checking
            }
            WorkerState::Checking => {
                let pause = self.draw(self.timing.check_ms);
                tracing::debug!(worker = %self.id, ms = pause.as_millis() as u64, "checking work");
                pause_for(pause);

                self.cycles_remaining -= 1;
                let cycle = self.cycles_completed();
                self.trace
                    .record(self.id, TraceEventKind::CycleComplete { cycle });
                tracing::info!(worker = %self.id, cycle, "cycle complete");

                if self.cycles_remaining > 0 {
                    WorkerState::AcquiringA
                } else {
                    self.finish()
                }
            }
            WorkerState::Done => WorkerState::Done,
        };
        self.state = next;
        next
    }

    /// Steps until `Done` and returns the summary.
    pub fn run(mut self) -> WorkerSummary {
        while !self.step().is_terminal() {}
        self.summary()
    }

    /// Returns what the worker has done so far.
    #[must_use]
    pub fn summary(&self) -> WorkerSummary {
        WorkerSummary {
            id: self.id,
            resource_a: self.resource_a.id(),
            resource_b: self.resource_b.id(),
            cycles_completed: self.cycles_completed(),
            final_state: self.state,
            contended_acquisitions: self.contended,
            total_wait: self.total_wait,
        }
    }

    fn resource(&self, kind: ResourceKind) -> Arc<Resource> {
        match kind {
            ResourceKind::A => Arc::clone(&self.resource_a),
            ResourceKind::B => Arc::clone(&self.resource_b),
        }
    }

    fn take(&mut self, kind: ResourceKind) {
        let resource = self.resource(kind);
        let (id, trace) = (self.id, &self.trace);
        let acquisition = resource.acquire_with(id, || {
            trace.record(
                id,
                TraceEventKind::Waiting {
                    resource: resource.id(),
                },
            );
        });
        if acquisition.contended {
            self.contended += 1;
            self.total_wait += acquisition.waited;
            tracing::debug!(
                worker = %self.id,
                resource = %resource.id(),
                waited_ms = acquisition.waited.as_millis() as u64,
                wakeups = acquisition.wakeups,
                "acquired after waiting"
            );
        }
        self.trace.record(
            self.id,
            TraceEventKind::Acquired {
                resource: resource.id(),
                contended: acquisition.contended,
            },
        );
        tracing::debug!(
            worker = %self.id,
            resource = %resource.id(),
            tool = resource.kind().tool_name(),
            "picked up"
        );
    }

    fn give_back(&mut self, kind: ResourceKind) {
        let resource = self.resource(kind);
        self.trace.record(
            self.id,
            TraceEventKind::Released {
                resource: resource.id(),
            },
        );
        resource.release(self.id);
        tracing::debug!(
            worker = %self.id,
            resource = %resource.id(),
            tool = resource.kind().tool_name(),
            "put down"
        );
    }

    fn finish(&mut self) -> WorkerState {
        self.trace.record(self.id, TraceEventKind::Finished);
        tracing::info!(
            worker = %self.id,
            cycles = self.cycles_completed(),
            "worker finished"
        );
        WorkerState::Done
    }

    fn draw(&mut self, bounds: Bounds) -> Duration {
        Duration::from_millis(self.rng.next_inclusive(bounds.min, bounds.max))
    }
}

fn pause_for(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lab::OracleSuite;
    use std::thread;

    fn init_test(name: &str) {
        crate::test_utils::init_test_logging();
        crate::test_phase!(name);
    }

    fn spec(id: usize, a: &Arc<Resource>, b: &Arc<Resource>, cycles: u32) -> WorkerSpec {
        WorkerSpec {
            id: WorkerId::new(id),
            resource_a: Arc::clone(a),
            resource_b: Arc::clone(b),
            timing: TimingProfile::instant(),
            cycles,
        }
    }

    fn pair() -> (Arc<Resource>, Arc<Resource>) {
        (
            Arc::new(Resource::new(ResourceId::a(0))),
            Arc::new(Resource::new(ResourceId::b(0))),
        )
    }

    #[test]
    fn single_cycle_visits_every_state() {
        init_test("single_cycle_visits_every_state");
        let (a, b) = pair();
        let trace = Arc::new(Trace::new());
        let mut worker = Worker::new(spec(0, &a, &b, 1), DetRng::new(1), Arc::clone(&trace));

        let mut states = vec![worker.state()];
        while !worker.state().is_terminal() {
            states.push(worker.step());
        }
        let expected = vec![
            WorkerState::Idle,
            WorkerState::AcquiringA,
            WorkerState::AcquiringB,
            WorkerState::Using,
            WorkerState::Releasing,
            WorkerState::Checking,
            WorkerState::Done,
        ];
        crate::assert_with_log!(states == expected, "states", expected, states);
        crate::test_complete!("single_cycle_visits_every_state");
    }

    #[test]
    fn holdings_match_state() {
        init_test("holdings_match_state");
        let (a, b) = pair();
        let trace = Arc::new(Trace::new());
        let mut worker = Worker::new(spec(3, &a, &b, 2), DetRng::new(1), trace);
        let me = WorkerId::new(3);

        while !worker.state().is_terminal() {
            let held = [a.holder(), b.holder()]
                .into_iter()
                .filter(|h| *h == Some(me))
                .count();
            crate::assert_with_log!(
                held == worker.state().held_on_entry(),
                "held",
                worker.state().held_on_entry(),
                held
            );
            worker.step();
        }
        crate::test_complete!("holdings_match_state");
    }

    #[test]
    fn cycles_loop_back_to_acquiring_a() {
        init_test("cycles_loop_back_to_acquiring_a");
        let (a, b) = pair();
        let trace = Arc::new(Trace::new());
        let mut worker = Worker::new(spec(0, &a, &b, 3), DetRng::new(1), Arc::clone(&trace));

        let mut after_check = Vec::new();
        while !worker.state().is_terminal() {
            let before = worker.state();
            let after = worker.step();
            if before == WorkerState::Checking {
                after_check.push(after);
            }
        }
        let expected = vec![
            WorkerState::AcquiringA,
            WorkerState::AcquiringA,
            WorkerState::Done,
        ];
        crate::assert_with_log!(after_check == expected, "after check", expected, after_check);
        crate::assert_with_log!(worker.cycles_completed() == 3, "completed", 3, worker.cycles_completed());
        crate::assert_with_log!(worker.cycles_remaining() == 0, "remaining", 0, worker.cycles_remaining());

        let step_again = worker.step();
        crate::assert_with_log!(step_again == WorkerState::Done, "done is sticky", WorkerState::Done, step_again);
        crate::test_complete!("cycles_loop_back_to_acquiring_a");
    }

    #[test]
    fn run_returns_summary_and_clean_trace() {
        init_test("run_returns_summary_and_clean_trace");
        let (a, b) = pair();
        let trace = Arc::new(Trace::new());
        let summary = Worker::new(spec(0, &a, &b, 5), DetRng::new(9), Arc::clone(&trace)).run();

        crate::assert_with_log!(summary.cycles_completed == 5, "cycles", 5, summary.cycles_completed);
        crate::assert_with_log!(summary.final_state == WorkerState::Done, "state", WorkerState::Done, summary.final_state);
        crate::assert_with_log!(summary.contended_acquisitions == 0, "contended", 0, summary.contended_acquisitions);

        let suite = OracleSuite::replay(&trace.events(), 5);
        let ok = suite.check_all().is_ok();
        crate::assert_with_log!(ok, "oracles", true, ok);
        crate::assert_with_log!(a.snapshot().is_balanced(), "A balanced", true, a.snapshot().is_balanced());
        crate::assert_with_log!(b.snapshot().is_balanced(), "B balanced", true, b.snapshot().is_balanced());
        crate::test_complete!("run_returns_summary_and_clean_trace");
    }

    #[test]
    fn shared_pair_serializes_two_workers() {
        init_test("shared_pair_serializes_two_workers");
        let (a, b) = pair();
        let trace = Arc::new(Trace::new());

        let handles: Vec<_> = (0..2)
            .map(|n| {
                let mut s = spec(n, &a, &b, 20);
                s.timing = TimingProfile::new(Bounds::new(0, 1), Bounds::fixed(0));
                let worker = Worker::new(s, DetRng::new(n as u64 + 1), Arc::clone(&trace));
                thread::spawn(move || worker.run())
            })
            .collect();
        let mut summaries = Vec::new();
        for handle in handles {
            let summary = handle.join().expect("worker panicked");
            crate::assert_with_log!(summary.cycles_completed == 20, "cycles", 20, summary.cycles_completed);
            summaries.push(summary);
        }

        let suite = OracleSuite::replay(&trace.events(), 20);
        let result = suite.check_all();
        crate::assert_with_log!(result.is_ok(), "oracles", "Ok(())", result);
        let snap = a.snapshot();
        crate::assert_with_log!(snap.acquisitions == 40, "A acquisitions", 40, snap.acquisitions);

        let worker_contended: u64 = summaries
            .iter()
            .map(|s| u64::from(s.contended_acquisitions))
            .sum();
        let resource_contended = a.snapshot().contended_acquisitions + b.snapshot().contended_acquisitions;
        crate::assert_with_log!(
            worker_contended == resource_contended,
            "worker and resource contention agree",
            resource_contended,
            worker_contended
        );
        let waits = trace
            .events()
            .iter()
            .filter(|e| matches!(e.kind, TraceEventKind::Waiting { .. }))
            .count() as u64;
        crate::assert_with_log!(waits == resource_contended, "one waiting event per contended acquire", resource_contended, waits);
        crate::test_complete!("shared_pair_serializes_two_workers");
    }

    #[test]
    fn zero_cycles_finishes_immediately() {
        init_test("zero_cycles_finishes_immediately");
        let (a, b) = pair();
        let trace = Arc::new(Trace::new());
        let mut worker = Worker::new(spec(0, &a, &b, 0), DetRng::new(1), Arc::clone(&trace));
        let next = worker.step();
        crate::assert_with_log!(next == WorkerState::Done, "state", WorkerState::Done, next);
        let untouched = a.snapshot().acquisitions == 0;
        crate::assert_with_log!(untouched, "A untouched", true, untouched);
        crate::test_complete!("zero_cycles_finishes_immediately");
    }

    #[test]
    #[should_panic(expected = "as its kind-A resource")]
    fn swapped_kinds_rejected() {
        let (a, b) = pair();
        let _ = Worker::new(spec(0, &b, &a, 1), DetRng::new(1), Arc::new(Trace::new()));
    }
}
