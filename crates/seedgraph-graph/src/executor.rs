//! Upsert executor: runs one built statement against a write context.
//!
//! The executor never retries. A failed statement surfaces as
//! [`UpsertError::Execution`] with the store's error attached.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use seedgraph_core::{NodeDescriptor, RelationshipDescriptor, UpsertConfig};

use crate::client::{GraphClient, GraphError};
use crate::error::{Result, UpsertError};
use crate::queries::{node_record, relationship_record, NodeRecord, RelationshipRecord};
use crate::statement::{Statement, StatementBuilder, StatementKind};

/// The entity a statement resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Node(NodeRecord),
    Relationship(RelationshipRecord),
}

impl Entity {
    pub fn into_node(self) -> Option<NodeRecord> {
        match self {
            Self::Node(node) => Some(node),
            Self::Relationship(_) => None,
        }
    }

    pub fn into_relationship(self) -> Option<RelationshipRecord> {
        match self {
            Self::Relationship(rel) => Some(rel),
            Self::Node(_) => None,
        }
    }
}

/// A scope that can execute statements atomically, one at a time.
///
/// Implemented for `neo4rs::Txn` (explicit write transaction) and for
/// [`GraphClient`] (auto-commit, one transaction per statement).
#[async_trait]
pub trait WriteContext: Send {
    /// Run one statement. Returns the entity it yields, or `None` for
    /// statements that return nothing (schema statements).
    async fn run(&mut self, statement: &Statement) -> std::result::Result<Option<Entity>, GraphError>;
}

#[async_trait]
impl WriteContext for neo4rs::Txn {
    async fn run(&mut self, statement: &Statement) -> std::result::Result<Option<Entity>, GraphError> {
        if statement.returns().is_none() {
            neo4rs::Txn::run(self, statement.to_query()).await?;
            return Ok(None);
        }

        let mut stream = self.execute(statement.to_query()).await?;
        let mut first = None;
        // Drain the stream so the transaction is ready for the next statement.
        while let Some(row) = stream.next(self.handle()).await? {
            first.get_or_insert(row);
        }
        match first {
            Some(row) => entity_from_row(&row, statement),
            None => Err(GraphError::EmptyResult { expected: "row" }),
        }
    }
}

/// A write context that ends in an explicit commit or rollback.
#[async_trait]
pub trait Transaction: WriteContext + Sized {
    async fn commit(self) -> std::result::Result<(), GraphError>;
    async fn rollback(self) -> std::result::Result<(), GraphError>;
}

#[async_trait]
impl Transaction for neo4rs::Txn {
    async fn commit(self) -> std::result::Result<(), GraphError> {
        neo4rs::Txn::commit(self).await?;
        Ok(())
    }

    async fn rollback(self) -> std::result::Result<(), GraphError> {
        neo4rs::Txn::rollback(self).await?;
        Ok(())
    }
}

#[async_trait]
impl WriteContext for GraphClient {
    async fn run(&mut self, statement: &Statement) -> std::result::Result<Option<Entity>, GraphError> {
        if statement.returns().is_none() {
            self.inner().run(statement.to_query()).await?;
            return Ok(None);
        }

        match self.query_one(statement.to_query()).await? {
            Some(row) => entity_from_row(&row, statement),
            None => Err(GraphError::EmptyResult { expected: "row" }),
        }
    }
}

fn entity_from_row(
    row: &neo4rs::Row,
    statement: &Statement,
) -> std::result::Result<Option<Entity>, GraphError> {
    match statement.kind() {
        StatementKind::MergeNode { .. } => {
            let node: neo4rs::Node = row.get("n").map_err(|e| {
                GraphError::Deserialization(format!("Failed to deserialize node: {e}"))
            })?;
            Ok(Some(Entity::Node(node_record(&node)?)))
        }
        StatementKind::Relationship { .. } => {
            let rel: neo4rs::Relation = row.get("r").map_err(|e| {
                GraphError::Deserialization(format!("Failed to deserialize relation: {e}"))
            })?;
            Ok(Some(Entity::Relationship(relationship_record(&rel)?)))
        }
        StatementKind::UniqueConstraint { .. } => Ok(None),
    }
}

/// Builds and runs upsert statements, one store call per operation.
#[derive(Debug, Clone)]
pub struct UpsertExecutor {
    builder: StatementBuilder,
    timeout: Option<Duration>,
}

impl UpsertExecutor {
    pub fn new(config: &UpsertConfig) -> Result<Self> {
        Ok(Self::from_builder(StatementBuilder::new(config)?))
    }

    pub fn from_builder(builder: StatementBuilder) -> Self {
        Self {
            builder,
            timeout: None,
        }
    }

    /// Fail any single statement that takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn builder(&self) -> &StatementBuilder {
        &self.builder
    }

    /// Execute a statement that must yield an entity.
    pub async fn execute<C>(&self, ctx: &mut C, statement: &Statement) -> Result<Entity>
    where
        C: WriteContext + ?Sized,
    {
        self.dispatch(ctx, statement)
            .await?
            .ok_or(UpsertError::Execution(GraphError::EmptyResult {
                expected: "entity",
            }))
    }

    /// Execute a statement that yields nothing (schema statements).
    pub async fn apply<C>(&self, ctx: &mut C, statement: &Statement) -> Result<()>
    where
        C: WriteContext + ?Sized,
    {
        self.dispatch(ctx, statement).await?;
        Ok(())
    }

    /// Find-or-create a node and overwrite its non-key properties.
    pub async fn upsert_node<C>(&self, ctx: &mut C, node: &NodeDescriptor) -> Result<NodeRecord>
    where
        C: WriteContext + ?Sized,
    {
        let statement = self.builder.merge_node(node)?;
        self.execute(ctx, &statement)
            .await?
            .into_node()
            .ok_or(UpsertError::Execution(GraphError::EmptyResult { expected: "node" }))
    }

    /// Find-or-create both endpoints and write the relationship between them.
    pub async fn upsert_relationship<C>(
        &self,
        ctx: &mut C,
        rel: &RelationshipDescriptor,
    ) -> Result<RelationshipRecord>
    where
        C: WriteContext + ?Sized,
    {
        let statement = self.builder.relate(rel)?;
        self.execute(ctx, &statement)
            .await?
            .into_relationship()
            .ok_or(UpsertError::Execution(GraphError::EmptyResult {
                expected: "relationship",
            }))
    }

    async fn dispatch<C>(&self, ctx: &mut C, statement: &Statement) -> Result<Option<Entity>>
    where
        C: WriteContext + ?Sized,
    {
        let started = Instant::now();
        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, ctx.run(statement))
                .await
                .unwrap_or(Err(GraphError::Timeout { limit })),
            None => ctx.run(statement).await,
        };

        tracing::debug!(
            statement = statement.text(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = outcome.is_ok(),
            "Executed statement"
        );
        Ok(outcome?)
    }
}
