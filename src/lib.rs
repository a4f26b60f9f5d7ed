// aubio-wrapper - tempo tracking and onset detection behind a flat C ABI
// Drop-in native library for managed callers that bound the historical
// `aubio_wrapper` shim

// Module declarations
pub mod analysis;
pub mod buffer;
pub mod config;
pub mod error;
pub mod facade;
pub mod ffi;

// Re-exports for convenience
pub use analysis::{AnalysisParams, Method, OnsetDetector, TempoTracker};
pub use buffer::SampleBuffer;
pub use error::{ErrorCode, WrapperError, WrapperErrorCodes, WrapperResult};
pub use facade::TempoStep;

use std::str::FromStr;

use log::info;

/// Environment variable holding the log level (`error` .. `trace`)
pub const LOG_ENV_VAR: &str = "AUBIO_WRAPPER_LOG";

/// Install a stderr tracing subscriber
///
/// The level comes from `AUBIO_WRAPPER_LOG` and defaults to `info`. `log`
/// records are bridged into the subscriber. Returns false when a global
/// subscriber is already installed, which leaves that subscriber in place.
pub fn init_logging() -> bool {
    let level = std::env::var(LOG_ENV_VAR)
        .ok()
        .and_then(|value| tracing::Level::from_str(value.trim()).ok())
        .unwrap_or(tracing::Level::INFO);

    let installed = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();

    if installed {
        info!(
            "aubio-wrapper {} logging at {}",
            env!("CARGO_PKG_VERSION"),
            level
        );
    }
    installed
}
