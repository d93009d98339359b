//! Fixed-size pool of resources of one kind.
//!
//! The pool only aggregates. Which worker may touch which resource is decided
//! by the [`AssignmentTable`](crate::assignment::AssignmentTable), not here.

use std::sync::Arc;

use crate::sync::{Resource, ResourceSnapshot};
use crate::types::{ResourceId, ResourceKind};

/// A fixed collection of [`Resource`]s sharing one kind.
#[derive(Debug, Clone)]
pub struct ResourcePool {
    kind: ResourceKind,
    resources: Vec<Arc<Resource>>,
}

impl ResourcePool {
    /// Creates `size` available resources of `kind`, indexed `0..size`.
    #[must_use]
    pub fn new(kind: ResourceKind, size: usize) -> Self {
        let resources = (0..size)
            .map(|index| Arc::new(Resource::new(ResourceId::new(kind, index))))
            .collect();
        Self { kind, resources }
    }

    /// Returns the kind of every resource in the pool.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Returns the number of resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns true if the pool has no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Returns the resource at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Arc<Resource>> {
        self.resources.get(index)
    }

    /// Iterates over the resources in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Resource>> {
        self.resources.iter()
    }

    /// Snapshots every resource in index order.
    #[must_use]
    pub fn snapshots(&self) -> Vec<ResourceSnapshot> {
        self.resources.iter().map(|r| r.snapshot()).collect()
    }

    /// Returns true if every resource is available and balanced.
    #[must_use]
    pub fn is_quiescent(&self) -> bool {
        self.resources.iter().all(|r| r.snapshot().is_balanced())
    }
}
