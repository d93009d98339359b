//! Static worker-to-resource assignment.
//!
//! Every worker is bound to exactly one resource of each kind for its whole
//! life. The table is computed once, before any worker starts, and is never
//! mutated.
//!
//! # Paired layout
//!
//! The default layout seats workers around a ring. With `M` resources per
//! kind, worker `i` is bound to
//!
//! - A index `(i / 2) % M`
//! - B index `((i + 1) / 2) % M`
//!
//! For 8 workers and 4 resources per kind this gives A = `[0,0,1,1,2,2,3,3]`
//! and B = `[0,1,1,2,2,3,3,0]`: every resource is shared by exactly two
//! neighbours, so neighbours contend, while the global A-before-B
//! acquisition order keeps the ring from closing into a deadlock.

use serde::Serialize;
use thiserror::Error;

use crate::types::{ResourceId, ResourceKind, WorkerId};

/// Errors found when validating an [`AssignmentTable`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignmentError {
    /// The table has no workers or no resources.
    #[error("assignment needs at least one worker and one resource per kind")]
    Empty,

    /// A worker is bound to an index outside its pool.
    #[error("worker {worker} is bound to {resource}, but the pool has {pool_size} resources")]
    OutOfRange {
        /// Offending worker.
        worker: WorkerId,
        /// Out-of-range resource.
        resource: ResourceId,
        /// Size of the pool of that kind.
        pool_size: usize,
    },

    /// A resource is not reachable by any worker.
    #[error("resource {resource} is not bound to any worker")]
    Uncovered {
        /// The unbound resource.
        resource: ResourceId,
    },
}

/// The pair of resource indices one worker is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Binding {
    /// Index into the kind-A pool.
    pub a: usize,
    /// Index into the kind-B pool.
    pub b: usize,
}

impl Binding {
    /// Returns the bound kind-A resource.
    #[must_use]
    pub const fn resource_a(self) -> ResourceId {
        ResourceId::a(self.a)
    }

    /// Returns the bound kind-B resource.
    #[must_use]
    pub const fn resource_b(self) -> ResourceId {
        ResourceId::b(self.b)
    }

    /// Returns the bound resource of `kind`.
    #[must_use]
    pub const fn resource(self, kind: ResourceKind) -> ResourceId {
        match kind {
            ResourceKind::A => self.resource_a(),
            ResourceKind::B => self.resource_b(),
        }
    }
}

/// Immutable mapping from worker index to its [`Binding`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentTable {
    resources_per_kind: usize,
    bindings: Vec<Binding>,
}

impl AssignmentTable {
    /// Builds and validates the paired ring layout.
    pub fn paired(workers: usize, resources_per_kind: usize) -> Result<Self, AssignmentError> {
        if workers == 0 || resources_per_kind == 0 {
            return Err(AssignmentError::Empty);
        }
        let table = Self::from_fn(workers, resources_per_kind, |i| {
            ((i / 2) % resources_per_kind, ((i + 1) / 2) % resources_per_kind)
        });
        table.validate()?;
        Ok(table)
    }

    /// Builds a table from a per-worker closure returning `(a, b)` indices.
    ///
    /// The result is not validated; call [`validate`](Self::validate) before
    /// binding workers to it.
    #[must_use]
    pub fn from_fn(
        workers: usize,
        resources_per_kind: usize,
        mut f: impl FnMut(usize) -> (usize, usize),
    ) -> Self {
        let bindings = (0..workers)
            .map(|i| {
                let (a, b) = f(i);
                Binding { a, b }
            })
            .collect();
        Self {
            resources_per_kind,
            bindings,
        }
    }

    /// Checks that every binding is in range and every resource is bound.
    pub fn validate(&self) -> Result<(), AssignmentError> {
        if self.bindings.is_empty() || self.resources_per_kind == 0 {
            return Err(AssignmentError::Empty);
        }

        for (worker, binding) in self.iter() {
            for kind in ResourceKind::ALL {
                let resource = binding.resource(kind);
                if resource.index() >= self.resources_per_kind {
                    return Err(AssignmentError::OutOfRange {
                        worker,
                        resource,
                        pool_size: self.resources_per_kind,
                    });
                }
            }
        }

        for kind in ResourceKind::ALL {
            if let Some(index) = self.share_counts(kind).iter().position(|&n| n == 0) {
                return Err(AssignmentError::Uncovered {
                    resource: ResourceId::new(kind, index),
                });
            }
        }
        Ok(())
    }

    /// Returns the number of workers.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.bindings.len()
    }

    /// Returns the pool size of each kind.
    #[must_use]
    pub const fn resources_per_kind(&self) -> usize {
        self.resources_per_kind
    }

    /// Returns the binding of `worker`.
    #[must_use]
    pub fn binding(&self, worker: WorkerId) -> Option<Binding> {
        self.bindings.get(worker.index()).copied()
    }

    /// Iterates over `(worker, binding)` pairs in worker order.
    pub fn iter(&self) -> impl Iterator<Item = (WorkerId, Binding)> + '_ {
        self.bindings
            .iter()
            .enumerate()
            .map(|(i, b)| (WorkerId::new(i), *b))
    }

    /// Returns the workers bound to `resource`.
    #[must_use]
    pub fn sharers(&self, resource: ResourceId) -> Vec<WorkerId> {
        self.iter()
            .filter(|(_, b)| b.resource(resource.kind()) == resource)
            .map(|(w, _)| w)
            .collect()
    }

    /// Returns, per index of `kind`, how many workers are bound to it.
    ///
    /// Out-of-range bindings are ignored.
    #[must_use]
    pub fn share_counts(&self, kind: ResourceKind) -> Vec<usize> {
        let mut counts = vec![0; self.resources_per_kind];
        for (_, binding) in self.iter() {
            if let Some(n) = counts.get_mut(binding.resource(kind).index()) {
                *n += 1;
            }
        }
        counts
    }

    /// Returns true if at least one resource is shared by two or more workers.
    #[must_use]
    pub fn has_contention(&self) -> bool {
        ResourceKind::ALL
            .iter()
            .any(|&kind| self.share_counts(kind).iter().any(|&n| n >= 2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn paired_eight_by_four_layout() {
        let table = AssignmentTable::paired(8, 4).expect("valid layout");
        let a: Vec<_> = table.iter().map(|(_, b)| b.a).collect();
        let b: Vec<_> = table.iter().map(|(_, b)| b.b).collect();
        assert_eq!(a, vec![0, 0, 1, 1, 2, 2, 3, 3]);
        assert_eq!(b, vec![0, 1, 1, 2, 2, 3, 3, 0]);
    }

    #[test]
    fn paired_eight_by_four_shares_every_resource_twice() {
        let table = AssignmentTable::paired(8, 4).expect("valid layout");
        for kind in ResourceKind::ALL {
            assert_eq!(table.share_counts(kind), vec![2, 2, 2, 2], "kind {kind}");
        }
        assert!(table.has_contention());
        assert_eq!(
            table.sharers(ResourceId::b(0)),
            vec![WorkerId::new(0), WorkerId::new(7)]
        );
    }

    #[test]
    fn paired_rejects_empty() {
        assert_eq!(AssignmentTable::paired(0, 4), Err(AssignmentError::Empty));
        assert_eq!(AssignmentTable::paired(8, 0), Err(AssignmentError::Empty));
    }

    #[test]
    fn paired_rejects_too_few_workers() {
        // Six workers only reach A0..A2.
        assert_eq!(
            AssignmentTable::paired(6, 4),
            Err(AssignmentError::Uncovered {
                resource: ResourceId::a(3)
            })
        );
    }

    #[test]
    fn out_of_range_binding_is_reported() {
        let table = AssignmentTable::from_fn(2, 1, |i| (0, i));
        assert_eq!(
            table.validate(),
            Err(AssignmentError::OutOfRange {
                worker: WorkerId::new(1),
                resource: ResourceId::b(1),
                pool_size: 1,
            })
        );
    }

    #[test]
    fn staggered_formula_truncates_negative_operand() {
        // Worker 0 evaluates (0 - 1) / 2. Rust's `/` truncates toward zero,
        // so the B index is 0; floor division would yield -1.
        assert_eq!((0_i64 - 1) / 2, 0);
        assert_eq!((0_i64 - 1).div_euclid(2), -1);

        let table = AssignmentTable::from_fn(8, 4, |i| {
            let i = i as i64;
            let a = ((i + 1) / 4) % 4;
            let b = (i - 1) / 2;
            (
                usize::try_from(a).expect("non-negative"),
                usize::try_from(b).expect("non-negative"),
            )
        });
        assert_eq!(table.binding(WorkerId::new(0)), Some(Binding { a: 0, b: 0 }));
        assert_eq!(table.share_counts(ResourceKind::A), vec![3, 4, 1, 0]);
        assert_eq!(table.share_counts(ResourceKind::B), vec![3, 2, 2, 1]);
        assert_eq!(
            table.validate(),
            Err(AssignmentError::Uncovered {
                resource: ResourceId::a(3)
            })
        );
    }

    #[test]
    fn binding_lookup_out_of_range() {
        let table = AssignmentTable::paired(2, 1).expect("valid layout");
        assert!(table.binding(WorkerId::new(2)).is_none());
        assert_eq!(table.workers(), 2);
        assert_eq!(table.resources_per_kind(), 1);
    }

    proptest! {
        #[test]
        fn paired_covers_each_resource_exactly_twice(per_kind in 1usize..=16) {
            let table = AssignmentTable::paired(per_kind * 2, per_kind).expect("valid layout");
            for kind in ResourceKind::ALL {
                prop_assert!(table.share_counts(kind).iter().all(|&n| n == 2));
            }
        }

        #[test]
        fn paired_bindings_stay_in_range(per_kind in 1usize..=8, extra in 0usize..=8) {
            let workers = per_kind * 2 + extra;
            let table = AssignmentTable::paired(workers, per_kind).expect("valid layout");
            prop_assert_eq!(table.workers(), workers);
            for (_, binding) in table.iter() {
                prop_assert!(binding.a < per_kind);
                prop_assert!(binding.b < per_kind);
            }
        }
    }
}
