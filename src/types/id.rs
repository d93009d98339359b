//! Identifier types for model entities.
//!
//! Workers and resources are addressed by small stable indices. The newtypes
//! keep a worker index from being passed where a resource index is expected,
//! and carry the resource kind so a bare `2` never has to be interpreted.

use core::fmt;
use serde::{Deserialize, Serialize};

/// The kind of a shared resource.
///
/// Kinds carry no behavior. The derived ordering (`A < B`) is the global
/// acquisition order every worker follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Fine-pointer tool. Always acquired first.
    A,
    /// Scaling tool. Always acquired second.
    B,
}

impl ResourceKind {
    /// Both kinds, in acquisition order.
    pub const ALL: [Self; 2] = [Self::A, Self::B];

    /// Returns the descriptive tool name for this kind.
    #[must_use]
    pub const fn tool_name(self) -> &'static str {
        match self {
            Self::A => "fine-pointer",
            Self::B => "scaler",
        }
    }

    /// Returns the single-letter tag for this kind.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A unique identifier for a worker.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(usize);

impl WorkerId {
    /// Creates a worker ID from its index.
    #[inline]
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the worker's index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorkerId({})", self.0)
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W{}", self.0)
    }
}

/// A unique identifier for a resource: its kind plus its index in the pool
/// of that kind.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId {
    kind: ResourceKind,
    index: usize,
}

impl ResourceId {
    /// Creates a resource ID.
    #[inline]
    #[must_use]
    pub const fn new(kind: ResourceKind, index: usize) -> Self {
        Self { kind, index }
    }

    /// Shorthand for a kind-A resource ID.
    #[inline]
    #[must_use]
    pub const fn a(index: usize) -> Self {
        Self::new(ResourceKind::A, index)
    }

    /// Shorthand for a kind-B resource ID.
    #[inline]
    #[must_use]
    pub const fn b(index: usize) -> Self {
        Self::new(ResourceKind::B, index)
    }

    /// Returns the resource kind.
    #[inline]
    #[must_use]
    pub const fn kind(self) -> ResourceKind {
        self.kind
    }

    /// Returns the index within the pool of this kind.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId({}{})", self.kind, self.index)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_order_is_acquisition_order() {
        assert!(ResourceKind::A < ResourceKind::B);
        assert_eq!(ResourceKind::ALL, [ResourceKind::A, ResourceKind::B]);
    }

    #[test]
    fn display_formats() {
        assert_eq!(WorkerId::new(3).to_string(), "W3");
        assert_eq!(ResourceId::a(1).to_string(), "A1");
        assert_eq!(ResourceId::b(0).to_string(), "B0");
        assert_eq!(format!("{:?}", ResourceId::b(2)), "ResourceId(B2)");
        assert_eq!(format!("{:?}", WorkerId::new(7)), "WorkerId(7)");
    }

    #[test]
    fn resource_ids_distinguish_kind() {
        assert_ne!(ResourceId::a(0), ResourceId::b(0));
        assert_eq!(ResourceId::a(2).kind(), ResourceKind::A);
        assert_eq!(ResourceId::b(2).index(), 2);
    }

    #[test]
    fn tool_names() {
        assert_eq!(ResourceKind::A.tool_name(), "fine-pointer");
        assert_eq!(ResourceKind::B.tool_name(), "scaler");
    }
}
