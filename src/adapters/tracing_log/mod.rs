// Tracing log adapter - Structured logging using tracing crate

use tracing_subscriber::EnvFilter;

use crate::adapters::toml_config::{parse_level, LoggingSettings};
use crate::error::SplitResult;

/// Tracing subscriber setup
pub struct TracingLogAdapter;

impl TracingLogAdapter {
    /// Build the event filter; `RUST_LOG` wins over the configured level
    pub fn filter(settings: &LoggingSettings) -> SplitResult<EnvFilter> {
        let level = parse_level(&settings.level)?;
        Ok(EnvFilter::builder()
            .with_default_directive(level.into())
            .from_env_lossy())
    }

    /// Install the global subscriber. Logs go to stderr so stdout only
    /// carries results. A second call keeps the first subscriber.
    pub fn init(settings: &LoggingSettings) -> SplitResult<()> {
        let filter = Self::filter(settings)?;
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false);

        let _ = if settings.json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };

        Ok(())
    }
}
