use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::browser::session::DriverConfig;
use crate::probe::executor::ProbeConfig;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "form-probe",
    version,
    about = "Discover a page's form fields and probe its validation in a headless browser"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: form-probe.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Node.js binary used to run the browser driver
    #[arg(long, global = true)]
    pub node: Option<String>,

    /// Browser driver script
    #[arg(long, global = true)]
    pub driver: Option<String>,

    /// Show the browser window
    #[arg(long, global = true)]
    pub headed: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the visible fields of the page's first form
    Analyze {
        /// Page containing the form (http/https)
        #[arg(long)]
        url: String,

        /// Output format: console, json
        #[arg(long, default_value = "console")]
        format: String,
    },

    /// Probe the first form and record a trace
    Run {
        /// Page containing the form (http/https)
        #[arg(long)]
        url: String,

        /// Directory receiving one subdirectory per run
        #[arg(long)]
        artifacts_dir: Option<String>,

        /// Output format: console, json, junit
        #[arg(long, default_value = "console")]
        format: String,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Free-form run option, repeatable
        #[arg(long = "option", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        options: Vec<(String, String)>,
    },

    /// Re-render a saved summary.json
    Report {
        /// Path to a summary.json from an earlier run
        #[arg(long)]
        summary: String,

        /// Output format: console, json, junit
        #[arg(long, default_value = "console")]
        format: String,
    },
}

/// Parse `key=value`; the value may itself contain `=`.
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `form-probe.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    #[serde(default = "default_artifacts_root")]
    pub root: String,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            root: default_artifacts_root(),
        }
    }
}

fn default_artifacts_root() -> String { "artifacts".to_string() }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("form-probe.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = config_path, error = %e, "malformed config; using defaults");
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Driver settings with CLI flags layered over the config file.
pub fn resolve_driver_config(cli: &Cli, config: &AppConfig) -> DriverConfig {
    let mut driver = config.driver.clone();
    if let Some(node) = &cli.node {
        driver.node = node.clone();
    }
    if let Some(script) = &cli.driver {
        driver.script = script.clone();
    }
    if cli.headed {
        driver.headless = false;
    }
    driver
}
