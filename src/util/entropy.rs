//! Seed sources for per-worker random generators.
//!
//! A run has one seed. Each worker's [`DetRng`] is derived from that seed and
//! the worker index, so workers draw independent streams and the run as a
//! whole replays from a single number.

use crate::types::WorkerId;
use crate::util::DetRng;

/// Draws a fresh run seed from the operating system.
///
/// Falls back to the wall clock if the OS source is unavailable; the seed is
/// only used for simulated durations.
#[must_use]
pub fn os_seed() -> u64 {
    let mut buf = [0u8; 8];
    match getrandom::fill(&mut buf) {
        Ok(()) => u64::from_le_bytes(buf),
        Err(err) => {
            tracing::warn!(%err, "OS entropy unavailable, seeding from clock");
            let nanos = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map_or(0, |d| d.as_nanos());
            mix_seed(nanos as u64)
        }
    }
}

/// Per-worker seed factory derived from one run seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerEntropy {
    run_seed: u64,
}

impl WorkerEntropy {
    /// Creates a factory from the run seed.
    #[must_use]
    pub const fn new(run_seed: u64) -> Self {
        Self { run_seed }
    }

    /// Returns the run seed.
    #[must_use]
    pub const fn run_seed(&self) -> u64 {
        self.run_seed
    }

    /// Deterministically derives the generator for one worker.
    #[must_use]
    pub fn for_worker(&self, worker: WorkerId) -> DetRng {
        let seed = self
            .run_seed
            .wrapping_mul(0x517c_c1b7_2722_0a95)
            .wrapping_add(worker.index() as u64);
        DetRng::new(mix_seed(seed))
    }
}

fn mix_seed(mut seed: u64) -> u64 {
    seed ^= seed >> 30;
    seed = seed.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    seed ^= seed >> 27;
    seed = seed.wrapping_mul(0x94d0_49bb_1331_11eb);
    seed ^= seed >> 31;
    seed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_worker_same_stream() {
        let entropy = WorkerEntropy::new(42);
        let mut a = entropy.for_worker(WorkerId::new(3));
        let mut b = entropy.for_worker(WorkerId::new(3));
        for _ in 0..16 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn workers_get_distinct_streams() {
        let entropy = WorkerEntropy::new(42);
        let mut a = entropy.for_worker(WorkerId::new(0));
        let mut b = entropy.for_worker(WorkerId::new(1));
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn run_seed_round_trips() {
        assert_eq!(WorkerEntropy::new(9).run_seed(), 9);
    }
}
