//! End-to-end load: constraints, then nodes, then relationships.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use seedgraph_core::NodeDescriptor;
use seedgraph_graph::{BatchLoader, GraphClient, Statement};

use crate::config::LoadConfig;
use crate::error::Result;
use crate::input::LoadInput;

/// Counts from a fully committed run.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub constraints: usize,
    pub nodes_by_label: BTreeMap<String, usize>,
    pub relationships: usize,
}

impl LoadReport {
    pub fn nodes(&self) -> usize {
        self.nodes_by_label.values().sum()
    }
}

pub struct LoadPipeline {
    config: LoadConfig,
    loader: BatchLoader,
}

impl LoadPipeline {
    pub fn new(config: LoadConfig) -> Result<Self> {
        let mut loader = BatchLoader::new(&config.upsert)?;
        if let Some(timeout) = config.statement_timeout() {
            loader = loader.with_timeout(timeout);
        }
        Ok(Self { config, loader })
    }

    /// Node descriptors selected by the label filter.
    pub fn selected_nodes(&self, input: &LoadInput) -> Vec<NodeDescriptor> {
        for label in &self.config.labels {
            if input.nodes.get(label).is_none() {
                tracing::warn!(label = %label, "Label filter matches no node input");
            }
        }
        input.nodes.descriptors(&self.config.labels)
    }

    /// Every statement a run would issue, in execution order, without
    /// touching the store.
    pub fn plan(&self, input: &LoadInput) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        if self.config.create_constraints {
            statements.extend(self.loader.constraint_statements(&input.schema)?);
        }
        statements.extend(self.loader.node_statements(&self.selected_nodes(input))?);
        statements.extend(self.loader.relationship_statements(&input.relationships)?);
        Ok(statements)
    }

    /// Run the load against Neo4j.
    ///
    /// Nodes and relationships each commit in their own write transaction.
    /// A failure rolls back the batch in progress and is returned; no report
    /// is produced for a partial run.
    pub async fn run(&self, client: &GraphClient, input: &LoadInput) -> Result<LoadReport> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("load", %run_id);
        self.run_inner(client, input, run_id).instrument(span).await
    }

    async fn run_inner(
        &self,
        client: &GraphClient,
        input: &LoadInput,
        run_id: Uuid,
    ) -> Result<LoadReport> {
        let started_at = Utc::now();

        let constraints = if self.config.create_constraints {
            let mut schema_ctx = client.clone();
            self.loader
                .ensure_constraints(&mut schema_ctx, &input.schema)
                .await?
        } else {
            0
        };

        let nodes = self.selected_nodes(input);
        let node_records = self.loader.load_nodes_in_transaction(client, &nodes).await?;
        tracing::info!(count = node_records.len(), "Nodes upserted");

        let rel_records = self
            .loader
            .load_relationships_in_transaction(client, &input.relationships)
            .await?;
        tracing::info!(count = rel_records.len(), "Relationships written");

        Ok(LoadReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            constraints,
            nodes_by_label: count_by_label(&nodes),
            relationships: rel_records.len(),
        })
    }
}

fn count_by_label(nodes: &[NodeDescriptor]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for node in nodes {
        *counts.entry(node.label.to_string()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedgraph_core::{RelationshipMode, UpsertConfig};
    use seedgraph_graph::UpsertError;

    use crate::error::LoadError;

    fn input() -> LoadInput {
        LoadInput {
            schema: serde_json::from_str(
                r#"{"nodes": {"Company": {"unique": ["name"]}, "City": {"unique": ["name"]}}}"#,
            )
            .unwrap(),
            nodes: serde_json::from_str(
                r#"{
                    "Company": [{"name": "Acme Corp", "founded": 1995}, {"name": "Acme Corp", "industry": "Tech"}],
                    "City": [{"name": "NYC"}]
                }"#,
            )
            .unwrap(),
            relationships: serde_json::from_str(
                r#"[{
                    "from_label": "Company", "from_props": {"name": "Acme Corp"},
                    "rel_type": "OPERATES_IN",
                    "to_label": "City", "to_props": {"name": "NYC"},
                    "rel_props": {"since_year": 2000}
                }]"#,
            )
            .unwrap(),
        }
    }

    #[test]
    fn test_plan_orders_constraints_nodes_relationships() {
        let pipeline = LoadPipeline::new(LoadConfig::default()).unwrap();
        let plan = pipeline.plan(&input()).unwrap();

        let texts: Vec<&str> = plan.iter().map(|s| s.text()).collect();
        assert_eq!(texts.len(), 6);
        assert!(texts[0].starts_with("CREATE CONSTRAINT IF NOT EXISTS FOR (n:`City`)"));
        assert!(texts[1].starts_with("CREATE CONSTRAINT IF NOT EXISTS FOR (n:`Company`)"));
        assert!(texts[2].starts_with("MERGE (n:`City`"));
        assert!(texts[3].starts_with("MERGE (n:`Company`"));
        assert!(texts[4].starts_with("MERGE (n:`Company`"));
        assert!(texts[5].contains("CREATE (a)-[r:`OPERATES_IN`"));
    }

    #[test]
    fn test_plan_honors_label_filter_and_constraint_switch() {
        let pipeline = LoadPipeline::new(LoadConfig {
            labels: vec!["Company".to_string()],
            create_constraints: false,
            ..Default::default()
        })
        .unwrap();
        let plan = pipeline.plan(&input()).unwrap();

        assert_eq!(plan.len(), 3);
        assert!(plan[0].text().starts_with("MERGE (n:`Company`"));
    }

    #[test]
    fn test_plan_uses_relationship_mode() {
        let pipeline = LoadPipeline::new(LoadConfig {
            upsert: UpsertConfig {
                relationship_mode: RelationshipMode::Merge,
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap();
        let plan = pipeline.plan(&input()).unwrap();
        assert!(plan
            .last()
            .unwrap()
            .text()
            .contains("MERGE (a)-[r:`OPERATES_IN`]->(b)"));
    }

    #[test]
    fn test_plan_fails_on_missing_unique_key() {
        let pipeline = LoadPipeline::new(LoadConfig {
            upsert: UpsertConfig {
                unique_key: "ticker".to_string(),
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap();
        let err = pipeline.plan(&input()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Upsert(UpsertError::Configuration(_))
        ));
    }

    #[test]
    fn test_invalid_unique_key_rejected_up_front() {
        let result = LoadPipeline::new(LoadConfig {
            upsert: UpsertConfig {
                unique_key: "full name".to_string(),
                ..Default::default()
            },
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_count_by_label() {
        let pipeline = LoadPipeline::new(LoadConfig::default()).unwrap();
        let counts = count_by_label(&pipeline.selected_nodes(&input()));
        assert_eq!(counts.get("Company"), Some(&2));
        assert_eq!(counts.get("City"), Some(&1));
    }
}
