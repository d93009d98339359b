//! Run orchestration: pools, assignment, worker threads.
//!
//! The [`Orchestrator`] turns a [`ModelConfig`] into two resource pools and
//! an [`AssignmentTable`], then spawns one OS thread per worker. The
//! returned [`RunHandle`] can be joined (optionally with a deadline) into a
//! [`RunReport`], or detached.
//!
//! ```no_run
//! use tandem::{ModelConfig, Orchestrator};
//!
//! let report = Orchestrator::new(ModelConfig::default().with_seed(7))?.run()?;
//! assert!(report.is_quiescent());
//! # Ok::<(), tandem::Error>(())
//! ```

pub mod report;

pub use report::RunReport;

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::assignment::AssignmentTable;
use crate::config::ModelConfig;
use crate::error::{Error, Result};
use crate::sync::ResourcePool;
use crate::trace::Trace;
use crate::types::{ResourceKind, WorkerId};
use crate::util::{WorkerEntropy, os_seed};
use crate::worker::{Worker, WorkerSpec, WorkerSummary};

/// Builds the model and launches its workers.
#[derive(Debug)]
pub struct Orchestrator {
    config: ModelConfig,
    seed: u64,
    table: AssignmentTable,
    pool_a: ResourcePool,
    pool_b: ResourcePool,
}

impl Orchestrator {
    /// Validates `config` and builds pools with the paired assignment.
    pub fn new(config: ModelConfig) -> Result<Self> {
        config.validate()?;
        let table = AssignmentTable::paired(config.workers, config.resources_per_kind)?;
        Ok(Self::assemble(config, table))
    }

    /// Validates `config` and builds pools with a caller-supplied assignment.
    ///
    /// The table's worker count and pool size must match the configuration.
    pub fn with_table(config: ModelConfig, table: AssignmentTable) -> Result<Self> {
        config.validate()?;
        if table.workers() != config.workers {
            return Err(Error::config(
                "workers",
                format!(
                    "assignment has {} workers, configuration has {}",
                    table.workers(),
                    config.workers
                ),
            ));
        }
        if table.resources_per_kind() != config.resources_per_kind {
            return Err(Error::config(
                "resources_per_kind",
                format!(
                    "assignment expects {} resources per kind, configuration has {}",
                    table.resources_per_kind(),
                    config.resources_per_kind
                ),
            ));
        }
        table.validate()?;
        Ok(Self::assemble(config, table))
    }

    fn assemble(config: ModelConfig, table: AssignmentTable) -> Self {
        let seed = config.seed.unwrap_or_else(os_seed);
        let pool_a = ResourcePool::new(ResourceKind::A, config.resources_per_kind);
        let pool_b = ResourcePool::new(ResourceKind::B, config.resources_per_kind);
        Self {
            config,
            seed,
            table,
            pool_a,
            pool_b,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Returns the seed the run will use.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the assignment table.
    #[must_use]
    pub const fn table(&self) -> &AssignmentTable {
        &self.table
    }

    /// Returns the pool of `kind`.
    #[must_use]
    pub const fn pool(&self, kind: ResourceKind) -> &ResourcePool {
        match kind {
            ResourceKind::A => &self.pool_a,
            ResourceKind::B => &self.pool_b,
        }
    }

    /// Spawns every worker and returns without waiting.
    pub fn spawn(self) -> Result<RunHandle> {
        let trace = Arc::new(Trace::new());
        let completion = Arc::new(Completion::new(self.table.workers()));
        let entropy = WorkerEntropy::new(self.seed);
        let started = Instant::now();

        tracing::info!(
            workers = self.table.workers(),
            resources_per_kind = self.table.resources_per_kind(),
            cycles = self.config.cycles,
            seed = self.seed,
            "starting run"
        );

        let mut handles = Vec::with_capacity(self.table.workers());
        for (id, binding) in self.table.iter() {
            let (Some(resource_a), Some(resource_b)) =
                (self.pool_a.get(binding.a), self.pool_b.get(binding.b))
            else {
                unreachable!("validated assignment binds {id} outside the pools");
            };
            let spec = WorkerSpec {
                id,
                resource_a: Arc::clone(resource_a),
                resource_b: Arc::clone(resource_b),
                timing: self.config.timing_for(id),
                cycles: self.config.cycles,
            };
            let worker = Worker::new(spec, entropy.for_worker(id), Arc::clone(&trace));
            let done = FinishGuard(Arc::clone(&completion));

            let handle = std::thread::Builder::new()
                .name(format!("worker-{}", id.index()))
                .spawn(move || {
                    let _done = done;
                    worker.run()
                })
                .map_err(|source| spawn_failed(id, source, handles.len()))?;
            handles.push((id, handle));
        }

        Ok(RunHandle {
            handles,
            completion,
            trace,
            table: self.table,
            pool_a: self.pool_a,
            pool_b: self.pool_b,
            seed: self.seed,
            cycles: self.config.cycles,
            started,
        })
    }

    /// Spawns every worker and waits for all of them.
    pub fn run(self) -> Result<RunReport> {
        self.spawn()?.join()
    }
}

/// Handle to a run in progress.
#[derive(Debug)]
pub struct RunHandle {
    handles: Vec<(WorkerId, JoinHandle<WorkerSummary>)>,
    completion: Arc<Completion>,
    trace: Arc<Trace>,
    table: AssignmentTable,
    pool_a: ResourcePool,
    pool_b: ResourcePool,
    seed: u64,
    cycles: u32,
    started: Instant,
}

impl RunHandle {
    /// Returns the live event trace.
    #[must_use]
    pub fn trace(&self) -> &Arc<Trace> {
        &self.trace
    }

    /// Returns the seed driving the run.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the number of workers that have not finished yet.
    #[must_use]
    pub fn unfinished(&self) -> usize {
        self.completion.remaining()
    }

    /// Waits for every worker and builds the report.
    pub fn join(self) -> Result<RunReport> {
        let mut workers = Vec::with_capacity(self.handles.len());
        let mut panicked = None;
        for (id, handle) in self.handles {
            match handle.join() {
                Ok(summary) => workers.push(summary),
                Err(_) => {
                    tracing::error!(worker = %id, "worker panicked");
                    panicked.get_or_insert(id);
                }
            }
        }
        if let Some(worker) = panicked {
            return Err(Error::WorkerPanicked { worker });
        }

        let elapsed = self.started.elapsed();
        let mut resources = self.pool_a.snapshots();
        resources.extend(self.pool_b.snapshots());
        tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "run complete");

        Ok(RunReport {
            seed: self.seed,
            cycles: self.cycles,
            elapsed,
            table: self.table,
            workers,
            resources,
            trace: self.trace.events(),
        })
    }

    /// Waits at most `timeout` for every worker to finish, then joins.
    ///
    /// On timeout the workers keep running, detached, and
    /// [`Error::Timeout`] reports how many were still going.
    pub fn join_timeout(self, timeout: Duration) -> Result<RunReport> {
        let unfinished = self.completion.wait_for(timeout);
        if unfinished > 0 {
            tracing::warn!(
                unfinished,
                timeout_ms = timeout.as_millis() as u64,
                "run did not finish in time"
            );
            return Err(Error::Timeout {
                waited: timeout,
                unfinished,
            });
        }
        self.join()
    }

    /// Lets the workers run to completion without waiting for them.
    pub fn detach(self) {
        tracing::info!(
            unfinished = self.completion.remaining(),
            "detaching from run"
        );
    }
}

/// Logs the workers left running by a failed spawn and builds the error.
fn spawn_failed(worker: WorkerId, source: std::io::Error, orphaned: usize) -> Error {
    if orphaned > 0 {
        tracing::warn!(
            worker = %worker,
            orphaned,
            "spawn failed; already started workers run on detached"
        );
    }
    Error::Spawn { worker, source }
}

/// Countdown of workers still running.
#[derive(Debug)]
struct Completion {
    remaining: Mutex<usize>,
    all_done: Condvar,
}

impl Completion {
    fn new(workers: usize) -> Self {
        Self {
            remaining: Mutex::new(workers),
            all_done: Condvar::new(),
        }
    }

    fn remaining(&self) -> usize {
        *self.remaining.lock()
    }

    fn finish_one(&self) {
        let mut remaining = self.remaining.lock();
        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            self.all_done.notify_all();
        }
    }

    /// Blocks until every worker finished or `timeout` passed; returns the
    /// number still running.
    fn wait_for(&self, timeout: Duration) -> usize {
        let deadline = Instant::now().checked_add(timeout);
        let mut remaining = self.remaining.lock();
        while *remaining > 0 {
            match deadline {
                Some(deadline) => {
                    if self.all_done.wait_until(&mut remaining, deadline).timed_out() {
                        break;
                    }
                }
                // Past the clock's range: no deadline.
                None => self.all_done.wait(&mut remaining),
            }
        }
        *remaining
    }
}

/// Counts a worker as finished when its thread ends, panic or not.
struct FinishGuard(Arc<Completion>);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.0.finish_one();
    }
}
