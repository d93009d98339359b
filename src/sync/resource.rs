//! Exclusively-held binary resource with guarded suspension.
//!
//! A [`Resource`] is either available or held by exactly one worker. The
//! state lives behind the resource's own mutex; blocked acquirers park on
//! the resource's condition variable and re-check availability on every
//! wake, so a spurious or stolen wakeup simply loops back into the wait.
//!
//! # Fairness
//!
//! Release wakes one waiter, chosen by the condition variable. A thread that
//! arrives between the release and the woken waiter re-taking the mutex may
//! win the resource instead. Every waiter is eventually woken; no FIFO order
//! is promised.
//!
//! # Caller discipline
//!
//! Releasing a resource the caller does not hold, or acquiring a resource the
//! caller already holds, is a programming error and panics.
//!
//! # Example
//!
//! ```
//! use tandem::sync::Resource;
//! use tandem::types::{ResourceId, WorkerId};
//!
//! let pencil = Resource::new(ResourceId::a(0));
//! let me = WorkerId::new(0);
//!
//! pencil.acquire(me);
//! assert!(!pencil.is_available());
//! pencil.release(me);
//! assert!(pencil.is_available());
//! ```

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::Serialize;

use crate::types::{ResourceId, ResourceKind, WorkerId};

/// What happened while acquiring a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acquisition {
    /// The resource was held by someone else when the caller arrived.
    pub contended: bool,
    /// Number of times the caller was woken before it won the resource.
    pub wakeups: u32,
    /// Time spent between calling `acquire` and winning the resource.
    pub waited: Duration,
}

/// Point-in-time counters for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceSnapshot {
    /// The resource.
    pub id: ResourceId,
    /// Whether the resource was available when the snapshot was taken.
    pub available: bool,
    /// Current holder, if any.
    pub holder: Option<WorkerId>,
    /// Successful acquisitions.
    pub acquisitions: u64,
    /// Releases.
    pub releases: u64,
    /// Acquisitions that had to wait.
    pub contended_acquisitions: u64,
}

impl ResourceSnapshot {
    /// Returns true if every acquisition has been matched by a release.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.acquisitions == self.releases && self.available
    }
}

#[derive(Debug, Default)]
struct ResourceState {
    holder: Option<WorkerId>,
    waiting: usize,
    acquisitions: u64,
    releases: u64,
    contended: u64,
}

/// A shared unit that at most one worker may hold at a time.
#[derive(Debug)]
pub struct Resource {
    id: ResourceId,
    state: Mutex<ResourceState>,
    released: Condvar,
}

impl Resource {
    /// Creates an available resource.
    #[must_use]
    pub fn new(id: ResourceId) -> Self {
        Self {
            id,
            state: Mutex::new(ResourceState::default()),
            released: Condvar::new(),
        }
    }

    /// Returns the resource's identifier.
    #[must_use]
    pub const fn id(&self) -> ResourceId {
        self.id
    }

    /// Returns the resource's kind.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.id.kind()
    }

    /// Returns true if no worker holds the resource.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.state.lock().holder.is_none()
    }

    /// Returns the current holder.
    #[must_use]
    pub fn holder(&self) -> Option<WorkerId> {
        self.state.lock().holder
    }

    /// Returns the number of workers currently parked in [`acquire`](Self::acquire).
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.state.lock().waiting
    }

    /// Blocks until the resource is available, then takes it for `caller`.
    ///
    /// The availability check and the transition to held happen under the
    /// resource mutex, so at most one caller wins each availability window.
    /// The mutex is released before returning; it is never held while the
    /// caller uses the resource.
    ///
    /// # Panics
    ///
    /// Panics if `caller` already holds this resource.
    pub fn acquire(&self, caller: WorkerId) -> Acquisition {
        self.acquire_with(caller, || {})
    }

    /// Like [`acquire`](Self::acquire), but calls `on_wait` once, under the
    /// resource lock, when the caller finds the resource held and is about
    /// to park.
    ///
    /// `on_wait` must not touch this resource.
    pub fn acquire_with(&self, caller: WorkerId, on_wait: impl FnOnce()) -> Acquisition {
        let started = Instant::now();
        let mut state = self.state.lock();
        assert!(
            state.holder != Some(caller),
            "{caller} acquired {} while already holding it",
            self.id
        );

        let contended = state.holder.is_some();
        if contended {
            tracing::debug!(
                worker = %caller,
                resource = %self.id,
                holder = ?state.holder,
                "waiting for resource"
            );
            on_wait();
        }

        let mut wakeups = 0u32;
        while state.holder.is_some() {
            state.waiting += 1;
            self.released.wait(&mut state);
            state.waiting -= 1;
            wakeups = wakeups.saturating_add(1);
        }

        state.holder = Some(caller);
        state.acquisitions += 1;
        if contended {
            state.contended += 1;
        }
        drop(state);

        Acquisition {
            contended,
            wakeups,
            waited: started.elapsed(),
        }
    }

    /// Releases the resource and wakes one blocked acquirer, if any.
    ///
    /// # Panics
    ///
    /// Panics if `caller` is not the current holder.
    pub fn release(&self, caller: WorkerId) {
        let mut state = self.state.lock();
        match state.holder {
            Some(holder) if holder == caller => {}
            Some(holder) => panic!("{caller} released {} held by {holder}", self.id),
            None => panic!("{caller} released {} which is not held", self.id),
        }
        state.holder = None;
        state.releases += 1;
        let has_waiters = state.waiting > 0;
        drop(state);

        if has_waiters {
            self.released.notify_one();
        }
    }

    /// Returns the resource's counters.
    #[must_use]
    pub fn snapshot(&self) -> ResourceSnapshot {
        let state = self.state.lock();
        ResourceSnapshot {
            id: self.id,
            available: state.holder.is_none(),
            holder: state.holder,
            acquisitions: state.acquisitions,
            releases: state.releases,
            contended_acquisitions: state.contended,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn init_test(name: &str) {
        crate::test_utils::init_test_logging();
        crate::test_phase!(name);
    }

    fn w(n: usize) -> WorkerId {
        WorkerId::new(n)
    }

    fn wait_until_parked(resource: &Resource, count: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while resource.waiting() < count {
            assert!(Instant::now() < deadline, "waiters never parked");
            thread::yield_now();
        }
    }

    #[test]
    fn new_resource_is_available() {
        init_test("new_resource_is_available");
        let r = Resource::new(ResourceId::a(0));
        let available = r.is_available();
        crate::assert_with_log!(available, "available", true, available);
        crate::assert_with_log!(r.holder().is_none(), "holder", None::<WorkerId>, r.holder());
        crate::assert_with_log!(r.kind() == ResourceKind::A, "kind", ResourceKind::A, r.kind());
        crate::test_complete!("new_resource_is_available");
    }

    #[test]
    fn acquire_release_flips_availability() {
        init_test("acquire_release_flips_availability");
        let r = Resource::new(ResourceId::b(1));

        let acq = r.acquire(w(0));
        crate::assert_with_log!(!acq.contended, "contended", false, acq.contended);
        crate::assert_with_log!(r.holder() == Some(w(0)), "holder", Some(w(0)), r.holder());

        r.release(w(0));
        let snap = r.snapshot();
        crate::assert_with_log!(snap.is_balanced(), "balanced", true, snap.is_balanced());
        crate::assert_with_log!(snap.acquisitions == 1, "acquisitions", 1, snap.acquisitions);
        crate::test_complete!("acquire_release_flips_availability");
    }

    #[test]
    fn blocked_acquirer_wakes_on_release() {
        init_test("blocked_acquirer_wakes_on_release");
        let r = Arc::new(Resource::new(ResourceId::a(0)));
        r.acquire(w(0));

        let waiter = {
            let r = Arc::clone(&r);
            thread::spawn(move || {
                let acq = r.acquire(w(1));
                r.release(w(1));
                acq
            })
        };

        wait_until_parked(&r, 1);
        r.release(w(0));

        let acq = waiter.join().expect("waiter panicked");
        crate::assert_with_log!(acq.contended, "contended", true, acq.contended);
        crate::assert_with_log!(acq.wakeups >= 1, "wakeups", ">= 1", acq.wakeups);

        let snap = r.snapshot();
        crate::assert_with_log!(snap.contended_acquisitions == 1, "contended", 1, snap.contended_acquisitions);
        crate::assert_with_log!(snap.is_balanced(), "balanced", true, snap.is_balanced());
        crate::test_complete!("blocked_acquirer_wakes_on_release");
    }

    #[test]
    fn wait_hook_runs_only_when_contended() {
        init_test("wait_hook_runs_only_when_contended");
        let r = Arc::new(Resource::new(ResourceId::b(2)));
        let hooked = Arc::new(AtomicUsize::new(0));

        let free = r.acquire_with(w(0), || {
            hooked.fetch_add(1, Ordering::SeqCst);
        });
        crate::assert_with_log!(!free.contended, "free acquire", false, free.contended);
        crate::assert_with_log!(hooked.load(Ordering::SeqCst) == 0, "no hook", 0, hooked.load(Ordering::SeqCst));

        let waiter = {
            let r = Arc::clone(&r);
            let hooked = Arc::clone(&hooked);
            thread::spawn(move || {
                let acq = r.acquire_with(w(1), || {
                    hooked.fetch_add(1, Ordering::SeqCst);
                });
                r.release(w(1));
                acq
            })
        };
        wait_until_parked(&r, 1);
        r.release(w(0));
        let acq = waiter.join().expect("waiter panicked");

        crate::assert_with_log!(acq.contended, "contended", true, acq.contended);
        let hooks = hooked.load(Ordering::SeqCst);
        crate::assert_with_log!(hooks == 1, "hook calls", 1, hooks);
        let snap = r.snapshot();
        crate::assert_with_log!(snap.contended_acquisitions == 1, "snapshot contended", 1, snap.contended_acquisitions);
        crate::test_complete!("wait_hook_runs_only_when_contended");
    }

    #[test]
    fn every_waiter_eventually_acquires() {
        init_test("every_waiter_eventually_acquires");
        let r = Arc::new(Resource::new(ResourceId::b(0)));
        r.acquire(w(0));

        let waiters: Vec<_> = (1..=4)
            .map(|n| {
                let r = Arc::clone(&r);
                thread::spawn(move || {
                    r.acquire(w(n));
                    r.release(w(n));
                })
            })
            .collect();

        wait_until_parked(&r, 4);
        r.release(w(0));
        for handle in waiters {
            handle.join().expect("waiter panicked");
        }

        let snap = r.snapshot();
        crate::assert_with_log!(snap.acquisitions == 5, "acquisitions", 5, snap.acquisitions);
        crate::assert_with_log!(snap.is_balanced(), "balanced", true, snap.is_balanced());
        crate::test_complete!("every_waiter_eventually_acquires");
    }

    #[test]
    fn mutual_exclusion_under_hammering() {
        init_test("mutual_exclusion_under_hammering");
        let r = Arc::new(Resource::new(ResourceId::a(0)));
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..6)
            .map(|n| {
                let r = Arc::clone(&r);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    for _ in 0..200 {
                        r.acquire(w(n));
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        thread::yield_now();
                        inside.fetch_sub(1, Ordering::SeqCst);
                        r.release(w(n));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker panicked");
        }

        let max = max_inside.load(Ordering::SeqCst);
        crate::assert_with_log!(max == 1, "max concurrent holders", 1, max);
        let snap = r.snapshot();
        crate::assert_with_log!(snap.acquisitions == 1200, "acquisitions", 1200, snap.acquisitions);
        crate::assert_with_log!(snap.is_balanced(), "balanced", true, snap.is_balanced());
        crate::test_complete!("mutual_exclusion_under_hammering");
    }

    #[test]
    #[should_panic(expected = "which is not held")]
    fn release_when_not_held_panics() {
        let r = Resource::new(ResourceId::a(2));
        r.release(w(0));
    }

    #[test]
    #[should_panic(expected = "held by W0")]
    fn release_by_non_holder_panics() {
        let r = Resource::new(ResourceId::a(2));
        r.acquire(w(0));
        r.release(w(1));
    }

    #[test]
    #[should_panic(expected = "while already holding it")]
    fn reentrant_acquire_panics() {
        let r = Resource::new(ResourceId::b(3));
        r.acquire(w(5));
        r.acquire(w(5));
    }
}
