//! Tracing subscriber setup for hosts embedding the importer

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize a tracing subscriber for import runs.
///
/// Log level comes from `RUST_LOG`, defaulting to `info`.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .compact();

    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
