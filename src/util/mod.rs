//! Internal utilities.

pub mod det_rng;
pub mod entropy;

pub use det_rng::DetRng;
pub use entropy::{WorkerEntropy, os_seed};
