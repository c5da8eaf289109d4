//! seedgraph-core: Descriptor types, schema model, and error handling for the seedgraph loader.
//!
//! This crate provides the foundational types shared by the graph and load crates:
//! - Validated identifiers and scalar property maps
//! - Node and relationship descriptors consumed by the batch loader
//! - The schema description used for uniqueness constraints
//! - Upsert configuration
//! - Validation and configuration error types

pub mod config;
pub mod error;
pub mod schema;
pub mod types;

pub use config::{RelationshipMode, UpsertConfig};
pub use error::{ConfigurationError, ValidationError};
pub use schema::GraphSchema;
pub use types::{
    Identifier, IdentifierKind, NodeBatches, NodeDescriptor, PropertyMap, PropertyValue,
    RelationshipDescriptor,
};
