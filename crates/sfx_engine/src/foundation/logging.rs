//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
///
/// Panics if a global logger has already been installed; hosts that set up
/// their own logger should call [`try_init`] instead.
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system, ignoring an already-installed logger
///
/// Returns `true` if this call installed the logger.
pub fn try_init() -> bool {
    env_logger::Builder::from_default_env()
        .is_test(cfg!(test))
        .try_init()
        .is_ok()
}
