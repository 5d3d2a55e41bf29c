//! Logging setup shared by the driver and its workers.
//!
//! # Environment Variables
//!
//! - `CAPGEN_LOG` - Log filter in `EnvFilter` syntax, e.g. `capgen=debug`
//!
//! Workers inherit the driver's environment, so one `CAPGEN_LOG` setting
//! applies to every process of a run.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "CAPGEN_LOG";

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "info" } else { "warn" }))
}

/// Installs the global subscriber, writing compact lines to stderr.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::registry()
        .with(filter(verbose))
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
