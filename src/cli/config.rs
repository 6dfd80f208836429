use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::form::request::FieldValue;
use crate::pipeline::context::{Endpoints, Timings};
use crate::pipeline::transport::BodyEncoding;
use crate::trace::logger::LogConfig;

pub const DEFAULT_CONFIG_PATH: &str = "account-forms.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "account-forms",
    version,
    about = "Submit account page forms over AJAX and report the outcome"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: account-forms.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Server the endpoints are relative to, e.g. http://localhost:8000
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Anti-forgery token issued by the page
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Page field as name=value; a bare name is a checked checkbox (repeatable)
    #[arg(long = "field", global = true, value_parser = parse_field)]
    pub page_fields: Vec<(String, FieldValue)>,

    /// Answer yes to confirmation prompts
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit page fields to an arbitrary endpoint
    Submit {
        /// Endpoint URL, absolute or relative to --base-url
        #[arg(long)]
        endpoint: String,

        /// HTTP method: get or post
        #[arg(long, default_value = "post")]
        method: String,

        /// Comma-separated field names to send (default: every --field)
        #[arg(long, value_delimiter = ',')]
        send: Vec<String>,
    },

    /// Save language, timezone, date format and notification toggles
    Preferences,

    /// Update the billing address
    Billing,

    /// Enable or disable two-factor authentication
    TwoFactor {
        #[command(subcommand)]
        action: TwoFactorAction,
    },

    /// Revoke another login session
    RevokeSession {
        /// Session id as listed on the profile page
        #[arg(long)]
        id: u64,
    },

    /// Start a payment for a subscription plan
    Pay {
        /// Plan id
        #[arg(long)]
        plan: u64,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwoFactorAction {
    Enable,
    Disable,
}

/// Parse `name=value` into a text field and a bare `name` into a checked flag.
pub fn parse_field(raw: &str) -> Result<(String, FieldValue), String> {
    let (name, value) = match raw.split_once('=') {
        Some((name, value)) => (name.trim(), FieldValue::Text(value.to_string())),
        None => (raw.trim(), FieldValue::Flag(true)),
    };
    if name.is_empty() {
        return Err(format!("field '{}' has no name", raw));
    }
    Ok((name.to_string(), value))
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `account-forms.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub encoding: BodyEncoding,

    #[serde(default)]
    pub endpoints: Endpoints,

    #[serde(default)]
    pub timings: Timings,

    #[serde(default)]
    pub log: LogConfig,
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if the file is missing;
/// a malformed file is reported on stderr and also yields defaults.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    match std::fs::read_to_string(config_path) {
        Ok(content) => match serde_yaml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: ignoring malformed config '{}': {}", config_path, e);
                AppConfig::default()
            }
        },
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Settings (merge CLI args with config file)
// ============================================================================

/// Values the pipeline is built from after CLI > config > default merging.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub encoding: BodyEncoding,
    pub endpoints: Endpoints,
    pub timings: Timings,
}

pub fn resolve_settings(cli: &Cli, config: &AppConfig) -> Settings {
    Settings {
        base_url: cli.base_url.clone().or_else(|| config.base_url.clone()),
        token: cli.token.clone().or_else(|| config.token.clone()),
        encoding: config.encoding,
        endpoints: config.endpoints.clone(),
        timings: config.timings,
    }
}
