//! Log subscriber setup for the command-line driver.
//!
//! Filter comes from `ACCOUNT_FORMS_LOG`, then `RUST_LOG`, then the config
//! file; `-v` flags raise it.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const DEFAULT_FILTER: &str = "account_forms=info,warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            _ => Self::Compact,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_filter")]
    pub filter: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            format: LogFormat::Compact,
        }
    }
}

fn default_filter() -> String {
    DEFAULT_FILTER.to_string()
}

impl LogConfig {
    /// Environment filter wins over the configured one.
    pub fn with_env(mut self) -> Self {
        if let Ok(filter) = std::env::var("ACCOUNT_FORMS_LOG").or_else(|_| std::env::var("RUST_LOG")) {
            self.filter = filter;
        }
        if let Ok(format) = std::env::var("ACCOUNT_FORMS_LOG_FORMAT") {
            self.format = LogFormat::parse(&format);
        }
        self
    }

    /// Raise the crate's level for `-v` (debug) and `-vv` (trace).
    pub fn with_verbosity(mut self, verbose: u8) -> Self {
        match verbose {
            0 => {}
            1 => self.filter = format!("{},account_forms=debug", self.filter),
            _ => self.filter = format!("{},account_forms=trace", self.filter),
        }
        self
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(config: &LogConfig) {
    let env_filter =
        EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    let _ = match config.format {
        LogFormat::Json => registry.with(layer.json()).try_init(),
        LogFormat::Pretty => registry.with(layer.pretty()).try_init(),
        LogFormat::Compact => registry.with(layer.compact()).try_init(),
    };
}
