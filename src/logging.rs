use crate::error::{ErrorKind, Result};
use burrow_config::LoggingConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber. Logs go to stderr so that documents
/// printed on stdout stay machine-readable.
///
/// `RUST_LOG` wins over everything, then `-v` (debug) or `-vv` (trace), then
/// the configured level.
pub fn init(config: &LoggingConfig, verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => config.level.to_lowercase(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json {
        registry.with(fmt::layer().with_writer(std::io::stderr).with_ansi(false).json()).try_init()
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr).compact()).try_init()
    };
    result.map_err(|e| ErrorKind::Logging(e.to_string()))?;
    Ok(())
}
