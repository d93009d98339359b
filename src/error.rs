//! Error types for configuring and running the model.
//!
//! Resource acquisition itself never fails: it only blocks. Everything that
//! can fail lives around it (loading configuration, validating the
//! assignment table, spawning threads, joining workers).

use std::time::Duration;

use thiserror::Error;

use crate::assignment::AssignmentError;
use crate::types::WorkerId;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the orchestration layer.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration value is out of range.
    #[error("invalid configuration for `{field}`: {reason}")]
    Config {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable explanation.
        reason: String,
    },

    /// The configuration file is not valid TOML for [`ModelConfig`](crate::ModelConfig).
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The assignment table is inconsistent with the pools.
    #[error(transparent)]
    Assignment(#[from] AssignmentError),

    /// The OS refused to create a worker thread.
    #[error("failed to spawn worker {worker}: {source}")]
    Spawn {
        /// Worker that could not be spawned.
        worker: WorkerId,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// A worker thread panicked before reaching `Done`.
    #[error("worker {worker} panicked")]
    WorkerPanicked {
        /// Worker whose thread panicked.
        worker: WorkerId,
    },

    /// Workers were still running when the join deadline passed.
    #[error("{unfinished} worker(s) still running after {waited:?}")]
    Timeout {
        /// How long the caller waited.
        waited: Duration,
        /// Number of workers that had not finished.
        unfinished: usize,
    },
}

impl Error {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Config {
            field,
            reason: reason.into(),
        }
    }

    /// Returns true if this error came from a join deadline.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
