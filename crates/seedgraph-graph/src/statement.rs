//! Cypher statement builder for idempotent upserts.
//!
//! Statement text is assembled only from validated [`Identifier`]s, each
//! quoted with backticks. Property values are always bound as parameters.
//! Parameters are namespaced by role (`node_`, `from_`, `to_`, `rel_`) so an
//! endpoint property can never shadow a relationship property.

use std::collections::BTreeMap;

use neo4rs::{query, Query};
use seedgraph_core::{
    ConfigurationError, Identifier, NodeDescriptor, PropertyMap, PropertyValue,
    RelationshipDescriptor, RelationshipMode, UpsertConfig,
};

use crate::error::Result;

/// A node matched by one or more identity properties.
#[derive(Debug, Clone, PartialEq)]
pub struct NodePattern {
    pub label: Identifier,
    pub identity: PropertyMap,
}

/// What a statement does, in structured form.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    /// Find-or-create a node on `key = identity`, then overwrite `set`.
    MergeNode {
        label: Identifier,
        key: Identifier,
        identity: PropertyValue,
        set: PropertyMap,
    },
    /// Find-or-create both endpoints, then create (or merge) the edge.
    Relationship {
        mode: RelationshipMode,
        from: NodePattern,
        rel_type: Identifier,
        to: NodePattern,
        properties: PropertyMap,
    },
    /// Idempotent uniqueness constraint.
    UniqueConstraint {
        label: Identifier,
        property: Identifier,
    },
}

/// A parameterized Cypher statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    text: String,
    params: BTreeMap<String, PropertyValue>,
    kind: StatementKind,
}

impl Statement {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &BTreeMap<String, PropertyValue> {
        &self.params
    }

    pub fn kind(&self) -> &StatementKind {
        &self.kind
    }

    /// Name of the returned column, if the statement yields an entity.
    pub fn returns(&self) -> Option<&'static str> {
        match self.kind {
            StatementKind::MergeNode { .. } => Some("n"),
            StatementKind::Relationship { .. } => Some("r"),
            StatementKind::UniqueConstraint { .. } => None,
        }
    }

    /// Build the neo4rs query with every parameter bound.
    pub fn to_query(&self) -> Query {
        self.params
            .iter()
            .fold(query(&self.text), |q, (name, value)| bind(q, name, value))
    }
}

/// Builds upsert statements for a fixed unique key and relationship mode.
#[derive(Debug, Clone)]
pub struct StatementBuilder {
    unique_key: Identifier,
    relationship_mode: RelationshipMode,
}

impl StatementBuilder {
    pub fn new(config: &UpsertConfig) -> std::result::Result<Self, ConfigurationError> {
        Ok(Self {
            unique_key: config.unique_key()?,
            relationship_mode: config.relationship_mode,
        })
    }

    pub fn unique_key(&self) -> &Identifier {
        &self.unique_key
    }

    pub fn relationship_mode(&self) -> RelationshipMode {
        self.relationship_mode
    }

    /// `MERGE` on the unique key, `SET` every other property.
    pub fn merge_node(&self, node: &NodeDescriptor) -> Result<Statement> {
        let key = &self.unique_key;
        let identity = node.properties.get(key.as_str()).cloned().ok_or_else(|| {
            ConfigurationError::MissingUniqueKey {
                label: node.label.to_string(),
                key: key.to_string(),
            }
        })?;

        let set = node.properties.without(key.as_str());

        let mut params = BTreeMap::new();
        params.insert(format!("node_{key}"), identity.clone());
        let set_clause = set_clause("n", &set, "node", &mut params);

        let text = format!(
            "MERGE (n:`{label}` {{`{key}`: $node_{key}}}){set_clause} RETURN n",
            label = node.label,
        );

        Ok(Statement {
            text,
            params,
            kind: StatementKind::MergeNode {
                label: node.label.clone(),
                key: key.clone(),
                identity,
                set,
            },
        })
    }

    /// `MERGE` both endpoints by their identity properties, then write the edge.
    ///
    /// In [`RelationshipMode::Create`] every execution creates a new edge.
    pub fn relate(&self, rel: &RelationshipDescriptor) -> Result<Statement> {
        for (endpoint, identity) in [("from", &rel.from_properties), ("to", &rel.to_properties)] {
            if identity.is_empty() {
                return Err(ConfigurationError::EmptyEndpointIdentity {
                    rel_type: rel.rel_type.to_string(),
                    endpoint,
                }
                .into());
            }
        }

        let mut params = BTreeMap::new();
        let from_pattern = inline_pattern(&rel.from_properties, "from", &mut params);
        let to_pattern = inline_pattern(&rel.to_properties, "to", &mut params);

        let edge = match self.relationship_mode {
            RelationshipMode::Create => {
                let props = if rel.rel_properties.is_empty() {
                    String::new()
                } else {
                    format!(" {{{}}}", inline_pattern(&rel.rel_properties, "rel", &mut params))
                };
                format!("CREATE (a)-[r:`{}`{props}]->(b)", rel.rel_type)
            }
            RelationshipMode::Merge => {
                let set_clause = set_clause("r", &rel.rel_properties, "rel", &mut params);
                format!("MERGE (a)-[r:`{}`]->(b){set_clause}", rel.rel_type)
            }
        };

        let text = format!(
            "MERGE (a:`{from_label}` {{{from_pattern}}}) MERGE (b:`{to_label}` {{{to_pattern}}}) {edge} RETURN r",
            from_label = rel.from_label,
            to_label = rel.to_label,
        );

        Ok(Statement {
            text,
            params,
            kind: StatementKind::Relationship {
                mode: self.relationship_mode,
                from: NodePattern {
                    label: rel.from_label.clone(),
                    identity: rel.from_properties.clone(),
                },
                rel_type: rel.rel_type.clone(),
                to: NodePattern {
                    label: rel.to_label.clone(),
                    identity: rel.to_properties.clone(),
                },
                properties: rel.rel_properties.clone(),
            },
        })
    }

    /// `CREATE CONSTRAINT IF NOT EXISTS` for one unique property.
    pub fn unique_constraint(&self, label: &Identifier, property: &Identifier) -> Statement {
        Statement {
            text: format!(
                "CREATE CONSTRAINT IF NOT EXISTS FOR (n:`{label}`) REQUIRE n.`{property}` IS UNIQUE"
            ),
            params: BTreeMap::new(),
            kind: StatementKind::UniqueConstraint {
                label: label.clone(),
                property: property.clone(),
            },
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// `` `k1`: $prefix_k1, `k2`: $prefix_k2 ``
fn inline_pattern(
    props: &PropertyMap,
    prefix: &str,
    params: &mut BTreeMap<String, PropertyValue>,
) -> String {
    props
        .iter()
        .map(|(name, value)| {
            params.insert(format!("{prefix}_{name}"), value.clone());
            format!("`{name}`: ${prefix}_{name}")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// `` SET var.`k1` = $prefix_k1, ... `` or empty when there is nothing to set.
fn set_clause(
    var: &str,
    props: &PropertyMap,
    prefix: &str,
    params: &mut BTreeMap<String, PropertyValue>,
) -> String {
    if props.is_empty() {
        return String::new();
    }
    let assignments = props
        .iter()
        .map(|(name, value)| {
            params.insert(format!("{prefix}_{name}"), value.clone());
            format!("{var}.`{name}` = ${prefix}_{name}")
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(" SET {assignments}")
}

pub(crate) fn bind(q: Query, name: &str, value: &PropertyValue) -> Query {
    match value {
        PropertyValue::Boolean(v) => q.param(name, *v),
        PropertyValue::Integer(v) => q.param(name, *v),
        PropertyValue::Float(v) => q.param(name, *v),
        PropertyValue::String(v) => q.param(name, v.as_str()),
    }
}
