//! Batch loader: constraint setup and ordered node/relationship loading.
//!
//! Every statement of a batch is built before the first store call, so a
//! configuration or validation problem anywhere in the batch aborts it with no
//! side effects. Execution is strictly sequential and stops at the first
//! failing item; results come back in input order.

use std::time::Duration;

use seedgraph_core::{GraphSchema, NodeDescriptor, RelationshipDescriptor, UpsertConfig};

use crate::client::{GraphClient, GraphError};
use crate::error::{Result, UpsertError};
use crate::executor::{Entity, Transaction, UpsertExecutor, WriteContext};
use crate::queries::{NodeRecord, RelationshipRecord};
use crate::statement::Statement;

#[derive(Debug, Clone)]
pub struct BatchLoader {
    executor: UpsertExecutor,
}

impl BatchLoader {
    pub fn new(config: &UpsertConfig) -> Result<Self> {
        Ok(Self {
            executor: UpsertExecutor::new(config)?,
        })
    }

    pub fn from_executor(executor: UpsertExecutor) -> Self {
        Self { executor }
    }

    /// Apply a per-statement timeout to everything this loader runs.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            executor: self.executor.with_timeout(timeout),
        }
    }

    pub fn executor(&self) -> &UpsertExecutor {
        &self.executor
    }

    // ── Statement Planning ───────────────────────────────────────

    pub fn constraint_statements(&self, schema: &GraphSchema) -> Result<Vec<Statement>> {
        let builder = self.executor.builder();
        Ok(schema
            .unique_constraints()?
            .iter()
            .map(|(label, property)| builder.unique_constraint(label, property))
            .collect())
    }

    pub fn node_statements(&self, nodes: &[NodeDescriptor]) -> Result<Vec<Statement>> {
        let builder = self.executor.builder();
        nodes.iter().map(|node| builder.merge_node(node)).collect()
    }

    pub fn relationship_statements(
        &self,
        rels: &[RelationshipDescriptor],
    ) -> Result<Vec<Statement>> {
        let builder = self.executor.builder();
        rels.iter().map(|rel| builder.relate(rel)).collect()
    }

    // ── Loading ──────────────────────────────────────────────────

    /// Create every uniqueness constraint declared in the schema.
    ///
    /// Must complete before node loading starts. Schema statements cannot
    /// share a transaction with data writes, so `ctx` is normally the
    /// auto-commit [`GraphClient`]. Returns the number of constraints issued.
    pub async fn ensure_constraints<C>(&self, ctx: &mut C, schema: &GraphSchema) -> Result<usize>
    where
        C: WriteContext + ?Sized,
    {
        let statements = self.constraint_statements(schema)?;
        for statement in &statements {
            self.executor.apply(ctx, statement).await?;
        }
        tracing::info!(constraints = statements.len(), "Uniqueness constraints ensured");
        Ok(statements.len())
    }

    /// Upsert nodes in order within `ctx`.
    pub async fn load_nodes<C>(&self, ctx: &mut C, nodes: &[NodeDescriptor]) -> Result<Vec<NodeRecord>>
    where
        C: WriteContext + ?Sized,
    {
        let statements = self.node_statements(nodes)?;
        self.run_all(ctx, &statements, Entity::into_node, "node").await
    }

    /// Write relationships in order within `ctx`.
    pub async fn load_relationships<C>(
        &self,
        ctx: &mut C,
        rels: &[RelationshipDescriptor],
    ) -> Result<Vec<RelationshipRecord>>
    where
        C: WriteContext + ?Sized,
    {
        let statements = self.relationship_statements(rels)?;
        self.run_all(ctx, &statements, Entity::into_relationship, "relationship")
            .await
    }

    /// Upsert nodes inside one write transaction: all of them or none.
    pub async fn load_nodes_in_transaction(
        &self,
        client: &GraphClient,
        nodes: &[NodeDescriptor],
    ) -> Result<Vec<NodeRecord>> {
        let statements = self.node_statements(nodes)?;
        let txn = client.start_txn().await?;
        self.commit_all(txn, &statements, Entity::into_node, "node")
            .await
    }

    /// Write relationships inside one write transaction: all of them or none.
    pub async fn load_relationships_in_transaction(
        &self,
        client: &GraphClient,
        rels: &[RelationshipDescriptor],
    ) -> Result<Vec<RelationshipRecord>> {
        let statements = self.relationship_statements(rels)?;
        let txn = client.start_txn().await?;
        self.commit_all(txn, &statements, Entity::into_relationship, "relationship")
            .await
    }

    /// Upsert nodes in an already open transaction, then commit it.
    ///
    /// Any failure, including an invalid descriptor, rolls the transaction
    /// back before the error is returned.
    pub async fn load_nodes_atomically<T: Transaction>(
        &self,
        txn: T,
        nodes: &[NodeDescriptor],
    ) -> Result<Vec<NodeRecord>> {
        match self.node_statements(nodes) {
            Ok(statements) => {
                self.commit_all(txn, &statements, Entity::into_node, "node")
                    .await
            }
            Err(e) => finish(txn, Err(e)).await,
        }
    }

    /// Write relationships in an already open transaction, then commit it.
    pub async fn load_relationships_atomically<T: Transaction>(
        &self,
        txn: T,
        rels: &[RelationshipDescriptor],
    ) -> Result<Vec<RelationshipRecord>> {
        match self.relationship_statements(rels) {
            Ok(statements) => {
                self.commit_all(txn, &statements, Entity::into_relationship, "relationship")
                    .await
            }
            Err(e) => finish(txn, Err(e)).await,
        }
    }

    async fn commit_all<T, R>(
        &self,
        mut txn: T,
        statements: &[Statement],
        extract: fn(Entity) -> Option<R>,
        expected: &'static str,
    ) -> Result<Vec<R>>
    where
        T: Transaction,
    {
        let result = self.run_all(&mut txn, statements, extract, expected).await;
        finish(txn, result).await
    }

    async fn run_all<C, T>(
        &self,
        ctx: &mut C,
        statements: &[Statement],
        extract: fn(Entity) -> Option<T>,
        expected: &'static str,
    ) -> Result<Vec<T>>
    where
        C: WriteContext + ?Sized,
    {
        let mut records = Vec::with_capacity(statements.len());
        for (index, statement) in statements.iter().enumerate() {
            let entity = match self.executor.execute(ctx, statement).await {
                Ok(entity) => entity,
                Err(e) => {
                    tracing::error!(index, kind = expected, error = %e, "Batch item failed");
                    return Err(e);
                }
            };
            let record = extract(entity)
                .ok_or(UpsertError::Execution(GraphError::EmptyResult { expected }))?;
            records.push(record);
        }
        Ok(records)
    }
}

/// Commit on success; roll back on failure and return the original error.
async fn finish<T, R>(txn: T, result: Result<Vec<R>>) -> Result<Vec<R>>
where
    T: Transaction,
{
    match result {
        Ok(records) => {
            txn.commit().await?;
            tracing::info!(count = records.len(), "Batch committed");
            Ok(records)
        }
        Err(e) => {
            if let Err(rollback) = txn.rollback().await {
                tracing::warn!(error = %rollback, "Rollback failed after batch error");
            } else {
                tracing::warn!(error = %e, "Batch rolled back");
            }
            Err(e)
        }
    }
}
