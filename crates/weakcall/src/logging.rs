#![forbid(unsafe_code)]

//! Optional structured logging.
//!
//! With the `tracing` feature enabled, every call that finds its target gone
//! emits a `TRACE` event (`weak callback skipped: target expired`) carrying
//! the target's type name. Without the feature nothing is compiled in.
//!
//! The `tracing-json` feature adds [`init_json_logging`], a JSON subscriber
//! for production binaries. Its filter is read from `WEAKCALL_LOG` using
//! `EnvFilter` syntax and defaults to `info`:
//!
//! ```text
//! WEAKCALL_LOG=weakcall=trace ./server
//! ```

/// Environment variable holding the JSON subscriber's filter directives.
pub const LOG_ENV_VAR: &str = "WEAKCALL_LOG";

/// Filter used when [`LOG_ENV_VAR`] is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

#[cfg(feature = "tracing")]
pub use tracing::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};

/// Install a global JSON subscriber filtered by [`LOG_ENV_VAR`].
///
/// Returns an error if a global subscriber is already installed.
#[cfg(feature = "tracing-json")]
pub fn init_json_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    use tracing_subscriber::EnvFilter;

    let filter = match EnvFilter::try_from_env(LOG_ENV_VAR) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(DEFAULT_FILTER),
    };

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
}
