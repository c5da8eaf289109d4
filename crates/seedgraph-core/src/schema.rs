//! Schema description: which node properties must be unique per label.
//!
//! ```json
//! { "nodes": { "Company": { "unique": ["name"] } } }
//! ```
//!
//! Sections other than `nodes` are ignored.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ValidationError;
use crate::types::Identifier;

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct GraphSchema {
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeSchema>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct NodeSchema {
    #[serde(default)]
    pub unique: Vec<String>,
}

impl GraphSchema {
    /// Every declared `(label, property)` uniqueness pair, labels in key order
    /// and properties in declaration order.
    pub fn unique_constraints(&self) -> Result<Vec<(Identifier, Identifier)>, ValidationError> {
        let mut pairs = Vec::new();
        for (label, node) in &self.nodes {
            let label = Identifier::label(label.as_str())?;
            for prop in &node.unique {
                pairs.push((label.clone(), Identifier::property(prop.as_str())?));
            }
        }
        Ok(pairs)
    }
}
