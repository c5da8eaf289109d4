//! seedgraph-graph: idempotent upserts into Neo4j.
//!
//! All writes go through three layers: the [`StatementBuilder`] turns
//! descriptors into parameterized Cypher, the [`UpsertExecutor`] runs one
//! statement against a [`WriteContext`], and the [`BatchLoader`] drives
//! ordered batches and constraint setup.

pub mod client;
pub mod error;
pub mod executor;
pub mod loader;
pub mod queries;
pub mod statement;

pub use client::{GraphClient, GraphConfig, GraphError};
pub use error::UpsertError;
pub use executor::{Entity, Transaction, UpsertExecutor, WriteContext};
pub use loader::BatchLoader;
pub use queries::{NodeRecord, RelationshipRecord};
pub use statement::{NodePattern, Statement, StatementBuilder, StatementKind};
