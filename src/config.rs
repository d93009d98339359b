//! Model configuration.
//!
//! A [`ModelConfig`] describes one run: how many workers and resources there
//! are, how many cycles each worker performs, how long the simulated steps
//! take, and which seed drives the durations. It can be built in code with
//! the `with_*` methods or loaded from TOML:
//!
//! ```toml
//! workers = 8
//! resources_per_kind = 4
//! cycles = 5
//! seed = 42
//!
//! [[timing]]
//! use_ms = { min = 30, max = 60 }
//! check_ms = { min = 40, max = 100 }
//!
//! [[timing]]
//! use_ms = { min = 30, max = 80 }
//! check_ms = { min = 40, max = 60 }
//! ```
//!
//! Worker `i` uses timing profile `i % timing.len()`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::WorkerId;

/// Default number of workers.
pub const DEFAULT_WORKERS: usize = 8;
/// Default number of resources of each kind.
pub const DEFAULT_RESOURCES_PER_KIND: usize = 4;
/// Default number of cycles each worker performs.
pub const DEFAULT_CYCLES: u32 = 5;

/// Inclusive millisecond bounds for a simulated duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    /// Lower bound, in milliseconds.
    pub min: u64,
    /// Upper bound, in milliseconds.
    pub max: u64,
}

impl Bounds {
    /// Creates bounds `[min, max]`.
    #[must_use]
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// Creates degenerate bounds that always yield `ms`.
    #[must_use]
    pub const fn fixed(ms: u64) -> Self {
        Self { min: ms, max: ms }
    }

    /// Returns true if `min <= max`.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.min <= self.max
    }
}

/// Simulated step durations for one class of worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingProfile {
    /// Time spent in `Using` while holding both resources.
    pub use_ms: Bounds,
    /// Time spent in `Checking` while holding nothing.
    pub check_ms: Bounds,
}

impl TimingProfile {
    /// Creates a profile.
    #[must_use]
    pub const fn new(use_ms: Bounds, check_ms: Bounds) -> Self {
        Self { use_ms, check_ms }
    }

    /// A profile where every step takes no time. Useful for stress runs.
    #[must_use]
    pub const fn instant() -> Self {
        Self::new(Bounds::fixed(0), Bounds::fixed(0))
    }
}

fn default_timing() -> Vec<TimingProfile> {
    vec![
        TimingProfile::new(Bounds::new(30, 60), Bounds::new(40, 100)),
        TimingProfile::new(Bounds::new(30, 80), Bounds::new(40, 60)),
    ]
}

/// Configuration for one run of the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Number of workers.
    pub workers: usize,
    /// Number of resources in each of the two pools.
    pub resources_per_kind: usize,
    /// Cycles each worker performs before finishing.
    pub cycles: u32,
    /// Seed for simulated durations. `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Timing profiles, assigned to workers round-robin.
    pub timing: Vec<TimingProfile>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            resources_per_kind: DEFAULT_RESOURCES_PER_KIND,
            cycles: DEFAULT_CYCLES,
            seed: None,
            timing: default_timing(),
        }
    }
}

impl ModelConfig {
    /// Parses a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Reads and parses a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Sets the worker count.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the pool size of each kind.
    #[must_use]
    pub fn with_resources_per_kind(mut self, resources: usize) -> Self {
        self.resources_per_kind = resources;
        self
    }

    /// Sets the cycle count.
    #[must_use]
    pub fn with_cycles(mut self, cycles: u32) -> Self {
        self.cycles = cycles;
        self
    }

    /// Sets the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replaces the timing profiles with a single profile for every worker.
    #[must_use]
    pub fn with_uniform_timing(mut self, profile: TimingProfile) -> Self {
        self.timing = vec![profile];
        self
    }

    /// Replaces the timing profiles.
    #[must_use]
    pub fn with_timing(mut self, timing: Vec<TimingProfile>) -> Self {
        self.timing = timing;
        self
    }

    /// Returns the timing profile of `worker`.
    ///
    /// # Panics
    ///
    /// Panics if the configuration has no timing profiles; call
    /// [`validate`](Self::validate) first.
    #[must_use]
    pub fn timing_for(&self, worker: WorkerId) -> TimingProfile {
        self.timing[worker.index() % self.timing.len()]
    }

    /// Checks every field for a usable value.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::config("workers", "must be at least 1"));
        }
        if self.resources_per_kind == 0 {
            return Err(Error::config("resources_per_kind", "must be at least 1"));
        }
        if self.cycles == 0 {
            return Err(Error::config("cycles", "must be at least 1"));
        }
        if self.timing.is_empty() {
            return Err(Error::config("timing", "needs at least one profile"));
        }
        for (i, profile) in self.timing.iter().enumerate() {
            if !profile.use_ms.is_valid() {
                return Err(Error::config(
                    "timing.use_ms",
                    format!(
                        "profile {i}: min {} exceeds max {}",
                        profile.use_ms.min, profile.use_ms.max
                    ),
                ));
            }
            if !profile.check_ms.is_valid() {
                return Err(Error::config(
                    "timing.check_ms",
                    format!(
                        "profile {i}: min {} exceeds max {}",
                        profile.check_ms.min, profile.check_ms.max
                    ),
                ));
            }
        }
        Ok(())
    }
}
