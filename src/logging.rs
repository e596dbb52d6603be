//! Logging setup for the provider process.
//!
//! Logs go to **stderr**; stdout belongs to the host's plugin protocol.
//! Lifecycle calls log with structured fields (`resource_type`, `id`,
//! `attempt`, `backoff_ms`) so a single resource can be followed through
//! create, retries and read-back.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: log filter, e.g. `info` or `hemmer_provider_appstream=debug`
//!
//! ```bash
//! # Follow every remote call and retry
//! RUST_LOG=hemmer_provider_appstream=debug ./hemmer-provider-appstream
//! ```

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn subscriber(default_level: &str) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::registry().with(filter(default_level)).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    )
}

/// Install the global subscriber at `info` unless `RUST_LOG` says otherwise.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default("info");
}

/// Install the global subscriber with a custom default level.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    subscriber(default_level).init();
}

/// Install the global subscriber, returning false if one is already set.
pub fn try_init_logging() -> bool {
    subscriber("info").try_init().is_ok()
}
