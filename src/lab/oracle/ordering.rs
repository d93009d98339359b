//! Acquisition order oracle.
//!
//! Verifies the global resource ordering that keeps the wait-for graph
//! acyclic: a worker only acquires a kind-B resource while holding its kind-A
//! resource, never acquires kind A while holding kind B, and holds nothing
//! when a cycle completes.

use std::collections::HashMap;
use std::fmt;

use crate::types::{ResourceId, ResourceKind, WorkerId};

/// How the ordering was broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderViolationKind {
    /// A kind-B resource was acquired without a kind-A resource held.
    BWithoutA,
    /// A kind-A resource was acquired while a kind-B resource was held.
    AAfterB,
    /// A cycle completed while the worker still held a resource.
    HeldAcrossCheck,
}

/// A worker broke the acquisition order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderViolation {
    /// Offending worker.
    pub worker: WorkerId,
    /// Resource involved (for `HeldAcrossCheck`, one still held).
    pub resource: ResourceId,
    /// What went wrong.
    pub kind: OrderViolationKind,
}

impl fmt::Display for OrderViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            OrderViolationKind::BWithoutA => write!(
                f,
                "{} acquired {} without holding a kind-A resource",
                self.worker, self.resource
            ),
            OrderViolationKind::AAfterB => write!(
                f,
                "{} acquired {} while holding a kind-B resource",
                self.worker, self.resource
            ),
            OrderViolationKind::HeldAcrossCheck => write!(
                f,
                "{} completed a cycle while holding {}",
                self.worker, self.resource
            ),
        }
    }
}

impl std::error::Error for OrderViolation {}

/// Oracle for detecting out-of-order acquisitions.
#[derive(Debug, Default)]
pub struct AcquisitionOrderOracle {
    /// Resources each worker currently holds.
    held: HashMap<WorkerId, Vec<ResourceId>>,
    /// Detected violations.
    violations: Vec<OrderViolation>,
}

impl AcquisitionOrderOracle {
    /// Creates a new oracle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn holds_kind(&self, worker: WorkerId, kind: ResourceKind) -> bool {
        self.held
            .get(&worker)
            .is_some_and(|held| held.iter().any(|r| r.kind() == kind))
    }

    /// Records that `worker` acquired `resource`.
    pub fn on_acquired(&mut self, worker: WorkerId, resource: ResourceId) {
        let violation = match resource.kind() {
            ResourceKind::B if !self.holds_kind(worker, ResourceKind::A) => {
                Some(OrderViolationKind::BWithoutA)
            }
            ResourceKind::A if self.holds_kind(worker, ResourceKind::B) => {
                Some(OrderViolationKind::AAfterB)
            }
            _ => None,
        };
        if let Some(kind) = violation {
            self.violations.push(OrderViolation {
                worker,
                resource,
                kind,
            });
        }
        self.held.entry(worker).or_default().push(resource);
    }

    /// Records that `worker` released `resource`.
    pub fn on_released(&mut self, worker: WorkerId, resource: ResourceId) {
        if let Some(held) = self.held.get_mut(&worker) {
            held.retain(|r| *r != resource);
        }
    }

    /// Records that `worker` completed a cycle.
    pub fn on_cycle_complete(&mut self, worker: WorkerId) {
        if let Some(&resource) = self.held.get(&worker).and_then(|held| held.first()) {
            self.violations.push(OrderViolation {
                worker,
                resource,
                kind: OrderViolationKind::HeldAcrossCheck,
            });
        }
    }

    /// Returns the first violation, if any.
    pub fn check(&self) -> Result<(), OrderViolation> {
        if let Some(violation) = self.violations.first() {
            return Err(violation.clone());
        }
        Ok(())
    }

    /// Returns every violation.
    #[must_use]
    pub fn violations(&self) -> &[OrderViolation] {
        &self.violations
    }

    /// Resets the oracle to its initial state.
    pub fn reset(&mut self) {
        self.held.clear();
        self.violations.clear();
    }
}
