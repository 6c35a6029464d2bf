//! Logging setup for wxbridge
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a
//! text or JSON formatting layer writing to stderr, leaving stdout to the
//! model's output.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use wxbridge_config::{LogFormat, TelemetryConfig};

/// Initialize logging from configuration
///
/// The configured filter wins over `default_filter`. An invalid directive
/// falls back to `info` rather than failing startup.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init(config: Option<&TelemetryConfig>, default_filter: &str) -> anyhow::Result<()> {
    let filter = resolve_filter(config, default_filter);
    let format = config.map_or(LogFormat::Text, |c| c.format);

    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Text => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_writer(std::io::stderr);

            registry.with(fmt_layer).try_init()
        }
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_writer(std::io::stderr);

            registry.with(fmt_layer).try_init()
        }
    };

    installed.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

/// Pick the filter directive, falling back to `info` when it does not parse
fn resolve_filter(config: Option<&TelemetryConfig>, default_filter: &str) -> EnvFilter {
    let directive = config
        .and_then(|c| c.filter.as_deref())
        .unwrap_or(default_filter);

    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_filter_overrides_default() {
        let config = TelemetryConfig {
            filter: Some("wxbridge_llm=debug".to_owned()),
            format: LogFormat::Text,
        };

        let filter = resolve_filter(Some(&config), "warn");
        assert_eq!(filter.to_string(), "wxbridge_llm=debug");
    }

    #[test]
    fn default_filter_used_without_config() {
        let filter = resolve_filter(None, "warn");
        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn invalid_directive_falls_back_to_info() {
        let config = TelemetryConfig {
            filter: Some("wxbridge=loud".to_owned()),
            format: LogFormat::Json,
        };

        let filter = resolve_filter(Some(&config), "warn");
        assert_eq!(filter.to_string(), "info");
    }
}
