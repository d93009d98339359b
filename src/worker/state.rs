//! Worker lifecycle states.

use core::fmt;

use serde::Serialize;

/// Where a worker is in its acquire, use, release, check cycle.
///
/// ```text
/// Idle -> AcquiringA -> AcquiringB -> Using -> Releasing -> Checking
///              ^                                               |
///              +------------- cycles remaining > 0 ------------+
///                                                              |
///                                                    otherwise Done
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Spawned, not yet started.
    #[default]
    Idle,
    /// Blocking on the kind-A resource.
    AcquiringA,
    /// Holding A, blocking on the kind-B resource.
    AcquiringB,
    /// Holding both resources for the use duration.
    Using,
    /// Giving both resources back.
    Releasing,
    /// Unsynchronized self-check; holds nothing.
    Checking,
    /// Terminal.
    Done,
}

impl WorkerState {
    /// Returns the state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AcquiringA => "acquiring_a",
            Self::AcquiringB => "acquiring_b",
            Self::Using => "using",
            Self::Releasing => "releasing",
            Self::Checking => "checking",
            Self::Done => "done",
        }
    }

    /// Returns true for `Done`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns how many resources a worker holds on entering this state.
    #[must_use]
    pub const fn held_on_entry(self) -> usize {
        match self {
            Self::Idle | Self::AcquiringA | Self::Checking | Self::Done => 0,
            Self::AcquiringB => 1,
            Self::Using | Self::Releasing => 2,
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
