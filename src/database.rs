//! Main database entry point for graphkern.
//!
//! This module provides [`GraphDatabase`], which wires the in-memory stores
//! behind the locking layer and hands out [`Transaction`]s.

use crate::transaction::Transaction;
use graphkern_concurrency::{LockManager, LockManagerConfig, TransactionLocks};
use graphkern_core::TxnId;
use graphkern_kernel::{GraphStore, LockingOperations, SchemaStateCache, SchemaStore};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// An in-memory graph database.
///
/// Every operation runs inside a [`Transaction`] obtained from
/// [`GraphDatabase::begin`]. Locks taken by an operation are held until the
/// transaction ends.
///
/// # Example
///
/// ```ignore
/// use graphkern::prelude::*;
///
/// let db = GraphDatabase::in_memory();
///
/// let tx = db.begin();
/// let node = tx.create_node();
/// tx.node_add_label(node, LabelId(1))?;
/// tx.commit();
/// ```
pub struct GraphDatabase {
    pub(crate) operations: LockingOperations,
    graph: Arc<GraphStore>,
    schema: Arc<SchemaStore>,
    schema_state: Arc<SchemaStateCache>,
    lock_manager: Arc<LockManager>,
    next_txn_id: AtomicU64,
}

impl GraphDatabase {
    /// Create an empty database with default lock settings.
    ///
    /// Deadlock detection is on and lock requests wait indefinitely.
    pub fn in_memory() -> Self {
        Self::builder().build()
    }

    /// Create a builder for custom configuration.
    pub fn builder() -> GraphDatabaseBuilder {
        GraphDatabaseBuilder::new()
    }

    /// Start a new transaction.
    pub fn begin(&self) -> Transaction<'_> {
        let txn = TxnId(self.next_txn_id.fetch_add(1, Ordering::SeqCst));
        debug!(txn = txn.0, "transaction started");
        let locks = Arc::new(TransactionLocks::new(txn, Arc::clone(&self.lock_manager)));
        Transaction::new(self, locks)
    }

    /// The graph store (nodes, relationships, graph properties).
    ///
    /// Reads through this handle take no locks.
    pub fn graph(&self) -> &Arc<GraphStore> {
        &self.graph
    }

    /// The schema store (indexes, constraints).
    ///
    /// Use this to drive index population, e.g. [`SchemaStore::set_index_online`].
    pub fn schema(&self) -> &Arc<SchemaStore> {
        &self.schema
    }

    /// The schema-state cache.
    pub fn schema_state(&self) -> &Arc<SchemaStateCache> {
        &self.schema_state
    }

    /// The lock manager shared by every transaction.
    pub fn lock_manager(&self) -> &Arc<LockManager> {
        &self.lock_manager
    }

    /// Lock configuration in effect.
    pub fn lock_config(&self) -> &LockManagerConfig {
        self.lock_manager.config()
    }
}

impl std::fmt::Debug for GraphDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphDatabase")
            .field("nodes", &self.graph.node_count())
            .field("lock_config", self.lock_manager.config())
            .field("next_txn_id", &self.next_txn_id.load(Ordering::Relaxed))
            .finish()
    }
}

/// Builder for database configuration.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
///
/// let db = GraphDatabase::builder()
///     .lock_timeout(Duration::from_secs(5))
///     .deadlock_detection(true)
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct GraphDatabaseBuilder {
    config: LockManagerConfig,
}

impl GraphDatabaseBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail lock requests that wait longer than `timeout`.
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.config.acquire_timeout = Some(timeout);
        self
    }

    /// Enable or disable wait-for-graph deadlock detection.
    ///
    /// With detection off, a deadlocked pair waits until one side times out,
    /// so disabling it without a [`lock_timeout`](Self::lock_timeout) can hang.
    pub fn deadlock_detection(mut self, enabled: bool) -> Self {
        self.config.deadlock_detection = enabled;
        self
    }

    /// Use a prepared lock configuration.
    pub fn lock_config(mut self, config: LockManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the database.
    pub fn build(self) -> GraphDatabase {
        let schema = Arc::new(SchemaStore::new());
        let graph = Arc::new(GraphStore::new(Arc::clone(&schema)));
        let schema_state = Arc::new(SchemaStateCache::new());
        let lock_manager = Arc::new(LockManager::with_config(self.config));

        // Schema writes go through the graph so new constraints are checked
        // against existing nodes.
        let operations = LockingOperations::new(
            graph.clone(),
            schema.clone(),
            graph.clone(),
            schema_state.clone(),
        );

        GraphDatabase {
            operations,
            graph,
            schema,
            schema_state,
            lock_manager,
            next_txn_id: AtomicU64::new(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_config() {
        let db = GraphDatabase::builder()
            .lock_timeout(Duration::from_millis(250))
            .deadlock_detection(false)
            .build();
        assert_eq!(db.lock_config().acquire_timeout, Some(Duration::from_millis(250)));
        assert!(!db.lock_config().deadlock_detection);

        let db = GraphDatabase::in_memory();
        assert_eq!(db.lock_config(), &LockManagerConfig::default());
    }

    #[test]
    fn test_builder_preset() {
        let db = GraphDatabase::builder()
            .lock_config(LockManagerConfig::with_timeout(Duration::from_secs(1)))
            .build();
        assert_eq!(db.lock_config().acquire_timeout, Some(Duration::from_secs(1)));
        assert!(db.lock_config().deadlock_detection);
    }

    #[test]
    fn test_transactions_get_distinct_ids() {
        let db = GraphDatabase::in_memory();
        let a = db.begin();
        let b = db.begin();
        assert_ne!(a.id(), b.id());
    }
}
