//! Logging helpers shared by unit and integration tests.
//!
//! Enabled for `cfg(test)` and by the `test-internals` feature so the
//! integration tests under `tests/` can use the same macros.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs a test-writer subscriber once per process.
///
/// Honors `RUST_LOG`; defaults to `info`.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_thread_names(true)
            .try_init();
    });
}

/// Marks the start of a test.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        ::tracing::info!(test = $name, "=== TEST START ===");
    };
}

/// Marks a named section inside a test.
#[macro_export]
macro_rules! test_section {
    ($name:expr) => {
        ::tracing::info!(section = $name, "--- {} ---", $name);
    };
}

/// Marks the successful end of a test.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        ::tracing::info!(test = $name, "=== TEST COMPLETE ===");
    };
}

/// Asserts `cond`, logging expected and actual values on failure.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {
        if !$cond {
            ::tracing::error!(
                message = $msg,
                expected = ?$expected,
                actual = ?$actual,
                "assertion failed"
            );
        }
        assert!($cond, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    };
}
