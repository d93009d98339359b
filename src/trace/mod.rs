//! In-memory event trace of a run.
//!
//! Workers append [`TraceEvent`]s as they move through their lifecycle. All
//! appends go through one lock, so the sequence numbers form a total order
//! consistent with real time, and timestamps are monotonic in sequence order.
//!
//! Workers record `Acquired` after `acquire` returns and `Released` before
//! calling `release`. A recorded holding interval is therefore always inside
//! the real one, which is what lets the oracles in [`crate::lab::oracle`]
//! judge mutual exclusion from the trace alone.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;

use crate::types::{ResourceId, WorkerId};

/// What a worker did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEventKind {
    /// The worker thread started.
    Spawned,
    /// The worker found `resource` held and is about to block on it.
    Waiting {
        /// Resource being waited for.
        resource: ResourceId,
    },
    /// The worker now holds `resource`.
    Acquired {
        /// Resource acquired.
        resource: ResourceId,
        /// Whether the worker had to wait.
        contended: bool,
    },
    /// The worker is giving `resource` back.
    Released {
        /// Resource released.
        resource: ResourceId,
    },
    /// The worker finished cycle number `cycle` (1-based).
    CycleComplete {
        /// Completed cycle number.
        cycle: u32,
    },
    /// The worker reached `Done`.
    Finished,
}

/// One recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TraceEvent {
    /// Position in the trace's total order.
    pub seq: u64,
    /// Time since the trace was created.
    pub at: Duration,
    /// Worker that produced the event.
    pub worker: WorkerId,
    /// The event itself.
    pub kind: TraceEventKind,
}

/// Append-only, thread-safe event log.
#[derive(Debug)]
pub struct Trace {
    epoch: Instant,
    events: Mutex<Vec<TraceEvent>>,
}

impl Default for Trace {
    fn default() -> Self {
        Self::new()
    }
}

impl Trace {
    /// Creates an empty trace whose clock starts now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Appends an event and returns it.
    pub fn record(&self, worker: WorkerId, kind: TraceEventKind) -> TraceEvent {
        let mut events = self.events.lock();
        let event = TraceEvent {
            seq: events.len() as u64,
            at: self.epoch.elapsed(),
            worker,
            kind,
        };
        events.push(event);
        event
    }

    /// Returns a copy of every event so far.
    #[must_use]
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().clone()
    }

    /// Returns the events produced by `worker`.
    #[must_use]
    pub fn events_for(&self, worker: WorkerId) -> Vec<TraceEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.worker == worker)
            .copied()
            .collect()
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}
