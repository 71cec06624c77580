//! Tracing setup for the `rotator` binary.
//!
//! The library never installs a subscriber; it only emits events under each
//! rotator's span. Binaries call [`init`] once at startup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize a stderr subscriber filtered by `RUST_LOG`.
///
/// Defaults to `warn` if unset, which still shows folders that could not be
/// deleted.
///
/// # Example
/// ```bash
/// RUST_LOG=rotator=debug rotator rotate --base-dir /data/erap
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
