//! Tandem: a two-resource mutual exclusion model.
//!
//! # Overview
//!
//! A fixed set of worker threads share two pools of exclusive resources,
//! kind A and kind B. Every worker is bound to one resource of each kind and
//! repeats a cycle: acquire A, acquire B, use both, release both, then check
//! its work while holding nothing. Every resource is shared by two workers,
//! so workers contend and must wait.
//!
//! # Core Guarantees
//!
//! - **Mutual exclusion**: a resource has at most one holder at any instant
//! - **Deadlock freedom**: every worker takes A strictly before B
//! - **No lost wake-ups**: waiters re-check availability under the resource lock
//! - **Owner-checked release**: only the holder may release a resource
//! - **Verifiable runs**: every acquisition and release lands in a totally
//!   ordered [`trace`](mod@trace) that the [`lab`] oracles replay
//!
//! # Module Structure
//!
//! - [`types`]: Identifiers for workers, resources and resource kinds
//! - [`sync`]: The guarded resource and its pools
//! - [`assignment`]: Worker-to-resource binding table
//! - [`worker`]: Worker state machine
//! - [`orchestrator`]: Builds a run, spawns threads, joins them into a report
//! - [`config`]: Run configuration, optionally loaded from TOML
//! - [`trace`](mod@trace): Ordered event log of a run
//! - [`lab`]: Oracles that check a trace against the protocol
//! - [`observability`]: Log levels and subscriber setup
//! - [`util`]: Deterministic RNG and seed entropy
//! - [`error`](mod@error): Error types
//!
//! # Example
//!
//! ```no_run
//! use tandem::{ModelConfig, Orchestrator};
//!
//! let report = Orchestrator::new(ModelConfig::default())?.run()?;
//! for worker in &report.workers {
//!     println!("{} finished {} cycles", worker.id, worker.cycles_completed);
//! }
//! # Ok::<(), tandem::Error>(())
//! ```

pub mod assignment;
pub mod config;
pub mod error;
pub mod lab;
pub mod observability;
pub mod orchestrator;
pub mod sync;
pub mod trace;
pub mod types;
pub mod util;
pub mod worker;

#[cfg(any(test, feature = "test-internals"))]
pub mod test_utils;

pub use assignment::{AssignmentError, AssignmentTable, Binding};
pub use config::{Bounds, ModelConfig, TimingProfile};
pub use error::{Error, Result};
pub use orchestrator::{Orchestrator, RunHandle, RunReport};
pub use sync::{Resource, ResourcePool, ResourceSnapshot};
pub use trace::{Trace, TraceEvent, TraceEventKind};
pub use types::{ResourceId, ResourceKind, WorkerId};
pub use worker::{Worker, WorkerState, WorkerSummary};
