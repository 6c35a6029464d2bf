#![allow(clippy::must_use_candidate)]

mod env;
mod loader;
pub mod telemetry;
pub mod watsonx;

use serde::Deserialize;

pub use telemetry::{LogFormat, TelemetryConfig};
pub use watsonx::*;

/// Top-level wxbridge configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// watsonx.ai client configuration
    pub watsonx: WatsonxConfig,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
