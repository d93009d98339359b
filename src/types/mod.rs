//! Core types shared across the model.
//!
//! - [`id`]: Identifier types (`WorkerId`, `ResourceId`, `ResourceKind`)

pub mod id;

pub use id::{ResourceId, ResourceKind, WorkerId};
