//! Verification support for runs of the model.
//!
//! The lab does not drive workers itself. It judges what they did: a finished
//! run's [`Trace`](crate::trace::Trace) is replayed through the
//! [`oracle`]s, each of which checks one protocol invariant.
//!
//! # Quick Start
//!
//! ```no_run
//! use tandem::lab::oracle::OracleSuite;
//! use tandem::{ModelConfig, Orchestrator};
//!
//! let config = ModelConfig::default().with_seed(42);
//! let cycles = config.cycles;
//! let report = Orchestrator::new(config)?.run()?;
//!
//! let suite = OracleSuite::replay(&report.trace, cycles);
//! assert!(suite.check_all().is_ok());
//! # Ok::<(), tandem::Error>(())
//! ```

pub mod oracle;

pub use oracle::{OracleSuite, OracleViolation};
