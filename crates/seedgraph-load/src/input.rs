//! JSON input files: schema, nodes grouped by label, relationships.

use std::path::Path;

use serde::de::DeserializeOwned;

use seedgraph_core::{GraphSchema, NodeBatches, RelationshipDescriptor};

use crate::config::LoadConfig;
use crate::error::{LoadError, Result};

/// Everything one load run consumes.
#[derive(Debug, Clone, Default)]
pub struct LoadInput {
    pub schema: GraphSchema,
    pub nodes: NodeBatches,
    pub relationships: Vec<RelationshipDescriptor>,
}

impl LoadInput {
    /// Read all input files named by `config`.
    ///
    /// The schema file is only read when constraint creation is enabled.
    pub fn read(config: &LoadConfig) -> Result<Self> {
        let schema = if config.create_constraints {
            read_json(&config.schema_path)?
        } else {
            GraphSchema::default()
        };
        let nodes: NodeBatches = read_json(&config.nodes_path)?;
        let relationships: Vec<RelationshipDescriptor> = read_json(&config.relationships_path)?;

        tracing::info!(
            labels = nodes.labels().count(),
            nodes = nodes.len(),
            relationships = relationships.len(),
            "Input files read"
        );
        Ok(Self {
            schema,
            nodes,
            relationships,
        })
    }
}

/// Read and deserialize one JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    fn config_in(dir: &Path) -> LoadConfig {
        LoadConfig {
            schema_path: write(
                dir,
                "schema.json",
                r#"{"nodes": {"Company": {"unique": ["name"]}}}"#,
            ),
            nodes_path: write(
                dir,
                "nodes.json",
                r#"{"Company": [{"name": "Acme Corp", "founded": 1995}]}"#,
            ),
            relationships_path: write(
                dir,
                "rels.json",
                r#"[{
                    "from_label": "Company", "from_props": {"name": "Acme Corp"},
                    "rel_type": "OPERATES_IN",
                    "to_label": "City", "to_props": {"name": "New York"},
                    "rel_props": {"since_year": 2000}
                }]"#,
            ),
            ..Default::default()
        }
    }

    #[test]
    fn test_read_all_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = LoadInput::read(&config_in(dir.path())).unwrap();

        assert_eq!(input.schema.unique_constraints().unwrap().len(), 1);
        assert_eq!(input.nodes.len(), 1);
        assert_eq!(input.relationships.len(), 1);
        assert_eq!(input.relationships[0].rel_type.as_str(), "OPERATES_IN");
    }

    #[test]
    fn test_schema_skipped_without_constraints() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoadConfig {
            schema_path: dir.path().join("missing.json"),
            create_constraints: false,
            ..config_in(dir.path())
        };
        let input = LoadInput::read(&config).unwrap();
        assert!(input.schema.nodes.is_empty());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoadConfig {
            nodes_path: dir.path().join("absent.json"),
            ..config_in(dir.path())
        };
        let err = LoadInput::read(&config).unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn test_unsafe_property_name_fails_parse() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoadConfig {
            nodes_path: write(dir.path(), "bad.json", r#"{"Company": [{"name; DROP": "x"}]}"#),
            ..config_in(dir.path())
        };
        let err = LoadInput::read(&config).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }
}
