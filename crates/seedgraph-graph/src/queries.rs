//! Entity records and read-back queries for loaded data.

use neo4rs::query;
use seedgraph_core::{Identifier, PropertyMap, PropertyValue};

use crate::client::{GraphClient, GraphError};
use crate::statement::bind;

/// A node as returned by the store.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct NodeRecord {
    /// Store-assigned internal id.
    pub id: i64,
    pub labels: Vec<String>,
    pub properties: PropertyMap,
}

/// A relationship as returned by the store.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RelationshipRecord {
    pub id: i64,
    pub rel_type: String,
    pub start_id: i64,
    pub end_id: i64,
    pub properties: PropertyMap,
}

impl GraphClient {
    /// Count nodes carrying a label.
    pub async fn count_nodes(&self, label: &Identifier) -> Result<i64, GraphError> {
        let q = query(&format!("MATCH (n:`{label}`) RETURN count(n) AS cnt"));

        match self.query_one(q).await? {
            Some(row) => Ok(row.get::<i64>("cnt").unwrap_or(0)),
            None => Ok(0),
        }
    }

    /// Count relationships of a type.
    pub async fn count_relationships(&self, rel_type: &Identifier) -> Result<i64, GraphError> {
        let q = query(&format!(
            "MATCH ()-[r:`{rel_type}`]->() RETURN count(r) AS cnt"
        ));

        match self.query_one(q).await? {
            Some(row) => Ok(row.get::<i64>("cnt").unwrap_or(0)),
            None => Ok(0),
        }
    }

    /// Find a node by label and one property value.
    pub async fn find_node(
        &self,
        label: &Identifier,
        key: &Identifier,
        value: &PropertyValue,
    ) -> Result<Option<NodeRecord>, GraphError> {
        let q = bind(
            query(&format!(
                "MATCH (n:`{label}` {{`{key}`: $value}}) RETURN n LIMIT 1"
            )),
            "value",
            value,
        );

        match self.query_one(q).await? {
            Some(row) => {
                let node: neo4rs::Node = row.get("n").map_err(|e| {
                    GraphError::Deserialization(format!("Failed to deserialize node: {e}"))
                })?;
                Ok(Some(node_record(&node)?))
            }
            None => Ok(None),
        }
    }
}

/// Convert a neo4rs::Node to a NodeRecord.
pub(crate) fn node_record(node: &neo4rs::Node) -> Result<NodeRecord, GraphError> {
    let mut properties = PropertyMap::new();
    for key in node.keys() {
        if let Some(value) = scalar_property(node.get::<PropertyValue>(&key), &key) {
            properties
                .insert(key.to_string(), value)
                .map_err(|e| GraphError::Deserialization(e.to_string()))?;
        }
    }

    Ok(NodeRecord {
        id: node.id(),
        labels: node.labels().iter().map(|l| l.to_string()).collect(),
        properties,
    })
}

/// Convert a neo4rs::Relation to a RelationshipRecord.
pub(crate) fn relationship_record(
    rel: &neo4rs::Relation,
) -> Result<RelationshipRecord, GraphError> {
    let mut properties = PropertyMap::new();
    for key in rel.keys() {
        if let Some(value) = scalar_property(rel.get::<PropertyValue>(&key), &key) {
            properties
                .insert(key.to_string(), value)
                .map_err(|e| GraphError::Deserialization(e.to_string()))?;
        }
    }

    Ok(RelationshipRecord {
        id: rel.id(),
        rel_type: rel.typ().to_string(),
        start_id: rel.start_node_id(),
        end_id: rel.end_node_id(),
        properties,
    })
}

// Properties written by other tools may be lists or maps; those are skipped.
fn scalar_property<E: std::fmt::Display>(
    value: Result<PropertyValue, E>,
    key: &str,
) -> Option<PropertyValue> {
    match value {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!(key, error = %e, "Skipping non-scalar property");
            None
        }
    }
}
