//! Error types for upsert and batch operations.

use seedgraph_core::{ConfigurationError, ValidationError};
use thiserror::Error;

use crate::client::GraphError;

#[derive(Error, Debug)]
pub enum UpsertError {
    /// Descriptor cannot be upserted as configured. Raised before any store call.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Name unsafe for statement construction. Raised before any store call.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The store rejected or failed a statement.
    #[error("Execution error: {0}")]
    Execution(#[from] GraphError),
}

impl UpsertError {
    /// Whether rerunning the whole batch could succeed.
    ///
    /// A failed transactional batch is rolled back whole, and node statements
    /// are MERGE-based, so the caller may replay it. Configuration and
    /// validation failures repeat on every attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Execution(_))
    }
}

pub type Result<T> = std::result::Result<T, UpsertError>;
