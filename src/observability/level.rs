//! Log severity levels.
//!
//! Maps the CLI's `--log-level` onto `tracing` filter directives.

use core::fmt;

/// Severity threshold for emitted log lines.
///
/// Levels are ordered from most verbose to least. `Info` shows worker spawn,
/// cycle and finish lines; `Debug` adds every acquire, release and wait.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum LogLevel {
    /// Everything.
    Trace,
    /// Per-resource activity.
    Debug,
    /// Worker lifecycle.
    #[default]
    Info,
    /// Join deadlines missed and similar.
    Warn,
    /// Failures only.
    Error,
}

impl LogLevel {
    /// Returns the lowercase level name, usable as a filter directive.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
