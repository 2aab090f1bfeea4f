use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::engine::traversal::DEFAULT_QUERY;
use crate::node::node_model::{DEFAULT_API_LEVEL, HostCapabilities};
use crate::service::lifecycle::{DEFAULT_CHANNEL_CAPACITY, ServiceConfig};

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "screen-search",
    version,
    about = "Finds the search field on a UI snapshot and submits a query"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Text to type into the search field
    #[arg(long, global = true)]
    pub query: Option<String>,

    /// Host API level (decides hint text and submit support)
    #[arg(long, global = true)]
    pub api_level: Option<u32>,

    /// Path to config file (default: screen-search.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every node of a snapshot tree in BFS order with its match verdict
    Inspect {
        /// Snapshot tree file (.json, .yaml or .yml)
        #[arg(long)]
        tree: String,
    },

    /// Replay a session of host events against the search service
    Replay {
        /// Session YAML file
        #[arg(long)]
        session: String,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `screen-search.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_query")]
    pub query: String,

    #[serde(default = "default_api_level")]
    pub api_level: u32,

    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    #[serde(default)]
    pub trace_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            query: default_query(),
            api_level: default_api_level(),
            channel_capacity: default_channel_capacity(),
            trace_path: None,
        }
    }
}

// Serde default helpers
fn default_query() -> String { DEFAULT_QUERY.to_string() }
fn default_api_level() -> u32 { DEFAULT_API_LEVEL }
fn default_channel_capacity() -> usize { DEFAULT_CHANNEL_CAPACITY }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("screen-search.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// CLI > config file > defaults.
pub fn build_service_config(
    config: &AppConfig,
    query: Option<&str>,
    api_level: Option<u32>,
) -> ServiceConfig {
    let level = api_level.unwrap_or(config.api_level);

    ServiceConfig {
        query: query.unwrap_or(&config.query).to_string(),
        capabilities: HostCapabilities::for_api_level(level),
        channel_capacity: config.channel_capacity,
        trace_path: config.trace_path.as_ref().map(PathBuf::from),
    }
}
