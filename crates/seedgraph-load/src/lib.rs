//! seedgraph-load: seeds a Neo4j graph from JSON node and relationship files.
//!
//! Reads a schema description, a node file grouped by label, and a
//! relationship file; creates uniqueness constraints, then upserts nodes and
//! relationships in one write transaction each.

pub mod config;
pub mod error;
pub mod input;
pub mod pipeline;
