//! Upsert settings shared by the statement builder and the loader.
//!
//! Loaded as the `[load.upsert]` section of `seedgraph.toml` or from
//! `SEEDGRAPH_LOAD__UPSERT__*` environment variables.

use serde::Deserialize;

use crate::error::ConfigurationError;
use crate::types::Identifier;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UpsertConfig {
    /// Property every node must carry; nodes are merged on it (default: "name").
    #[serde(default = "default_unique_key")]
    pub unique_key: String,

    /// How relationships are written between merged endpoints.
    #[serde(default)]
    pub relationship_mode: RelationshipMode,
}

/// Relationship write semantics.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipMode {
    /// `CREATE` a new edge on every run. Rerunning a descriptor duplicates the edge.
    #[default]
    Create,
    /// `MERGE` one edge per endpoint pair and type, then overwrite its properties.
    Merge,
}

impl UpsertConfig {
    /// The unique key as a validated property name.
    pub fn unique_key(&self) -> Result<Identifier, ConfigurationError> {
        Identifier::property(self.unique_key.as_str()).map_err(ConfigurationError::InvalidUniqueKey)
    }
}

fn default_unique_key() -> String {
    "name".to_string()
}

impl Default for UpsertConfig {
    fn default() -> Self {
        Self {
            unique_key: default_unique_key(),
            relationship_mode: RelationshipMode::default(),
        }
    }
}
