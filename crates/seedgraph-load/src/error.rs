//! Error types for the seedgraph-load crate.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Upsert error: {0}")]
    Upsert(#[from] seedgraph_graph::UpsertError),

    #[error("Graph error: {0}")]
    Graph(#[from] seedgraph_graph::GraphError),
}

pub type Result<T> = std::result::Result<T, LoadError>;
