//! Logging setup.
//!
//! The library only emits `tracing` events. Installing a subscriber is up to
//! the binary (`init_logging`, feature `cli`) or the test helpers.

pub mod level;

pub use level::LogLevel;

/// Installs a formatted stderr subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default` applies to every target.
/// Returns false if a global subscriber was already installed.
#[cfg(feature = "cli")]
pub fn init_logging(default: LogLevel) -> bool {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .try_init()
        .is_ok()
}
