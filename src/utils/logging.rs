//! Logging setup and the debug-gated logging macro.
//!
//! Usage:
//! ```rust,ignore
//! use crate::log_debug;
//!
//! log_debug!("start time candidate {}", clock);
//! ```
//!
//! `log_debug!` only emits when the process-wide debug flag is on. The flag is
//! set once at startup from the persisted settings (see [`crate::settings`])
//! or the `FLEXTIME_DEBUG` environment variable.

use std::sync::atomic::{AtomicBool, Ordering};

use log::LevelFilter;

/// Environment override for the debug toggle.
pub const DEBUG_ENV_VAR: &str = "FLEXTIME_DEBUG";

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

pub fn set_debug(enabled: bool) {
    DEBUG_ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

/// Reads `FLEXTIME_DEBUG`; `None` when unset so the persisted value wins.
pub fn debug_from_env() -> Option<bool> {
    std::env::var(DEBUG_ENV_VAR)
        .ok()
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
}

/// Initialize `env_logger` (reads `RUST_LOG`) and store the debug flag.
///
/// Safe to call more than once; later calls only update the flag.
pub fn init(debug: bool) {
    set_debug(debug);

    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init();
}

/// Debug logging gated on [`debug_enabled`].
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if $crate::utils::logging::debug_enabled() {
            ::log::debug!(target: "flextime", $($arg)*);
        }
    };
}
