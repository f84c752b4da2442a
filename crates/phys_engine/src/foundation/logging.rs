//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
///
/// Safe to call more than once; subsequent calls are ignored so tests can
/// initialize logging independently.
pub fn init() {
    let _ = env_logger::try_init();
}
