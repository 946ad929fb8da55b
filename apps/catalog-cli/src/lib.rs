//! Shared setup for the catalog binaries.

use anyhow::Context;
use tracing_subscriber::{fmt, EnvFilter};

use catalog_core::config::Config;

/// Logs go to stderr so stdout stays clean for JSON output.
/// `RUST_LOG` wins over the configured filter; each `-v` raises the level.
pub fn init_tracing(config: &Config, verbose: u8) {
    let fallback = match verbose {
        0 => config.log.filter.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn load_config() -> anyhow::Result<Config> {
    Config::load().context("loading configuration")
}
