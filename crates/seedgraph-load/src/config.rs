//! Configuration for the seedgraph-load command.

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, Map};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use seedgraph_core::UpsertConfig;
use seedgraph_graph::GraphConfig;

/// Top-level load configuration.
///
/// Loaded from the `seedgraph.toml` `[load]` section or
/// `SEEDGRAPH_LOAD__*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct LoadConfig {
    /// Schema description with per-label unique properties.
    #[serde(default = "default_schema_path")]
    pub schema_path: PathBuf,

    /// Node input grouped by label.
    #[serde(default = "default_nodes_path")]
    pub nodes_path: PathBuf,

    /// Relationship descriptors.
    #[serde(default = "default_relationships_path")]
    pub relationships_path: PathBuf,

    /// Only load nodes with these labels. Empty loads every label.
    #[serde(default)]
    pub labels: Vec<String>,

    /// Create uniqueness constraints from the schema before loading.
    #[serde(default = "default_true")]
    pub create_constraints: bool,

    /// Per-statement timeout in seconds; 0 disables it.
    #[serde(default)]
    pub statement_timeout_secs: u64,

    #[serde(default)]
    pub upsert: UpsertConfig,
}

impl LoadConfig {
    pub fn statement_timeout(&self) -> Option<Duration> {
        (self.statement_timeout_secs > 0).then(|| Duration::from_secs(self.statement_timeout_secs))
    }
}

fn default_schema_path() -> PathBuf {
    PathBuf::from("neo4j/schema.json")
}

fn default_nodes_path() -> PathBuf {
    PathBuf::from("data/add_nodes_to_graph.json")
}

fn default_relationships_path() -> PathBuf {
    PathBuf::from("data/add_relationships_to_graph.json")
}

fn default_true() -> bool {
    true
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            schema_path: default_schema_path(),
            nodes_path: default_nodes_path(),
            relationships_path: default_relationships_path(),
            labels: Vec::new(),
            create_constraints: default_true(),
            statement_timeout_secs: 0,
            upsert: UpsertConfig::default(),
        }
    }
}

// ── Layered Settings ─────────────────────────────────────────────

/// Read `<file_prefix>.toml` (if present), then `SEEDGRAPH_*` environment
/// variables on top of it.
///
/// `SEEDGRAPH_LOAD__UPSERT__RELATIONSHIP_MODE` maps to
/// `load.upsert.relationship_mode`, `SEEDGRAPH_NEO4J__URI` to `neo4j.uri`.
pub fn load_settings(file_prefix: &str) -> Result<Config, ConfigError> {
    build_settings(file_prefix, None)
}

fn build_settings(
    file_prefix: &str,
    env: Option<Map<String, String>>,
) -> Result<Config, ConfigError> {
    Config::builder()
        .add_source(File::with_name(file_prefix).required(false))
        .add_source(
            Environment::with_prefix("SEEDGRAPH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        )
        .build()
}

/// Deserialize one section. Only an absent section falls back to defaults;
/// a present section with a bad value is an error.
fn section<T: DeserializeOwned + Default>(settings: &Config, key: &str) -> Result<T, ConfigError> {
    match settings.get::<T>(key) {
        Err(ConfigError::NotFound(_)) => Ok(T::default()),
        other => other,
    }
}

impl LoadConfig {
    /// The `[load]` section.
    pub fn from_settings(settings: &Config) -> Result<Self, ConfigError> {
        section(settings, "load")
    }
}

/// The `[neo4j]` section.
pub fn graph_config(settings: &Config) -> Result<GraphConfig, ConfigError> {
    section(settings, "neo4j")
}
