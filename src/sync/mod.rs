//! Synchronization primitives for the model.
//!
//! - [`Resource`]: exclusively-held unit with blocking acquire and wake-on-release
//! - [`ResourcePool`]: fixed collection of resources of one kind

pub mod pool;
pub mod resource;

pub use pool::ResourcePool;
pub use resource::{Acquisition, Resource, ResourceSnapshot};
