//! Run logging: stderr for operators, plus a plain-text file that is mailed
//! with the summary and archived at the end of the run.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Log to stderr and append to `log_path`.
///
/// `RUST_LOG` overrides `default_directive`. Fails without touching
/// `log_path` if a global subscriber is already installed.
pub fn init(log_path: &Path, default_directive: &str) -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        bail!("tracing subscriber already installed; not logging to {}", log_path.display());
    }
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .with_context(|| format!("invalid log directive `{default_directive}`"))?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("open {}", log_path.display()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init()
        .context("install tracing subscriber")?;
    Ok(())
}
