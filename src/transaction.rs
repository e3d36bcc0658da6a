//! Transactions.
//!
//! A [`Transaction`] owns one lock client and the statement context that
//! carries it. Every operation goes through the database's
//! [`LockingOperations`](graphkern_kernel::LockingOperations), so the lock it
//! needs is taken first and kept until the transaction ends.
//!
//! ```text
//! begin() ──► operation ──► operation ──► commit() / rollback() / drop
//!              │              │                 │
//!              └─ lock held ──┴─ lock held ─────┴─► release_all
//! ```
//!
//! Writes reach the in-memory stores as soon as an operation succeeds.
//! Ending the transaction, either way, only releases its locks.

use crate::database::GraphDatabase;
use crate::error::Result;
use graphkern_concurrency::{Locks, TransactionLocks};
use graphkern_core::{
    DefinedProperty, IndexDescriptor, InternalIndexState, LabelId, LockRequest, NodeId, Property,
    PropertyKeyId, RelationshipId, SchemaStateKey, SchemaStateValue, TxnId, UniquenessConstraint,
    Value,
};
use graphkern_kernel::{
    EntityWriteOperations, KernelStatement, SchemaReadOperations, SchemaStateExt,
    SchemaStateOperations, SchemaWriteOperations,
};
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// A unit of work against a [`GraphDatabase`].
pub struct Transaction<'db> {
    db: &'db GraphDatabase,
    locks: Arc<TransactionLocks>,
    statement: KernelStatement,
}

impl<'db> Transaction<'db> {
    pub(crate) fn new(db: &'db GraphDatabase, locks: Arc<TransactionLocks>) -> Self {
        let client: Arc<dyn Locks> = locks.clone();
        Transaction {
            db,
            locks,
            statement: KernelStatement::new(client),
        }
    }

    /// Transaction id.
    pub fn id(&self) -> TxnId {
        self.locks.txn_id()
    }

    /// The statement context passed to kernel operations.
    pub fn statement(&self) -> &KernelStatement {
        &self.statement
    }

    /// Check whether this transaction currently holds `request`.
    pub fn holds(&self, request: LockRequest) -> bool {
        self.locks.holds(request)
    }

    /// Number of distinct resources this transaction has locked.
    pub fn lock_count(&self) -> usize {
        self.db.lock_manager().lock_count(self.id())
    }

    /// End the transaction, releasing its locks.
    pub fn commit(self) {
        let released = self.locks.release_all();
        debug!(txn = self.id().0, released, "transaction committed");
    }

    /// Abandon the transaction, releasing its locks.
    pub fn rollback(self) {
        let released = self.locks.release_all();
        debug!(txn = self.id().0, released, "transaction rolled back");
    }

    // ========================================================================
    // Entity creation (no lock: a new id is invisible to other transactions)
    // ========================================================================

    /// Create a node.
    pub fn create_node(&self) -> NodeId {
        self.db.graph().create_node()
    }

    /// Create a node with a chosen id. Returns `false` if it already exists.
    pub fn create_node_with_id(&self, id: NodeId) -> bool {
        self.db.graph().create_node_with_id(id)
    }

    /// Create a relationship between two existing nodes.
    pub fn create_relationship(&self, start: NodeId, end: NodeId) -> Result<RelationshipId> {
        Ok(self.db.graph().create_relationship(start, end)?)
    }

    // ========================================================================
    // Entity writes
    // ========================================================================

    /// Add a label to a node. Returns `false` if it was already present.
    pub fn node_add_label(&self, node: NodeId, label: LabelId) -> Result<bool> {
        Ok(self.db.operations.node_add_label(&self.statement, node, label)?)
    }

    /// Remove a label from a node. Returns `false` if it was absent.
    pub fn node_remove_label(&self, node: NodeId, label: LabelId) -> Result<bool> {
        Ok(self.db.operations.node_remove_label(&self.statement, node, label)?)
    }

    /// Delete a node.
    pub fn node_delete(&self, node: NodeId) -> Result<()> {
        Ok(self.db.operations.node_delete(&self.statement, node)?)
    }

    /// Delete a relationship.
    pub fn relationship_delete(&self, relationship: RelationshipId) -> Result<()> {
        Ok(self
            .db
            .operations
            .relationship_delete(&self.statement, relationship)?)
    }

    /// Set a node property, returning the previous one.
    pub fn node_set_property(
        &self,
        node: NodeId,
        key: PropertyKeyId,
        value: impl Into<Value>,
    ) -> Result<Property> {
        let property = DefinedProperty::new(key, value);
        Ok(self
            .db
            .operations
            .node_set_property(&self.statement, node, property)?)
    }

    /// Remove a node property, returning the removed one.
    pub fn node_remove_property(&self, node: NodeId, key: PropertyKeyId) -> Result<Property> {
        Ok(self
            .db
            .operations
            .node_remove_property(&self.statement, node, key)?)
    }

    /// Set a relationship property, returning the previous one.
    pub fn relationship_set_property(
        &self,
        relationship: RelationshipId,
        key: PropertyKeyId,
        value: impl Into<Value>,
    ) -> Result<Property> {
        let property = DefinedProperty::new(key, value);
        Ok(self
            .db
            .operations
            .relationship_set_property(&self.statement, relationship, property)?)
    }

    /// Remove a relationship property, returning the removed one.
    pub fn relationship_remove_property(
        &self,
        relationship: RelationshipId,
        key: PropertyKeyId,
    ) -> Result<Property> {
        Ok(self
            .db
            .operations
            .relationship_remove_property(&self.statement, relationship, key)?)
    }

    /// Set a graph property, returning the previous one.
    pub fn graph_set_property(&self, key: PropertyKeyId, value: impl Into<Value>) -> Result<Property> {
        let property = DefinedProperty::new(key, value);
        Ok(self.db.operations.graph_set_property(&self.statement, property)?)
    }

    /// Remove a graph property, returning the removed one.
    pub fn graph_remove_property(&self, key: PropertyKeyId) -> Result<Property> {
        Ok(self.db.operations.graph_remove_property(&self.statement, key)?)
    }

    // ========================================================================
    // Schema writes
    // ========================================================================

    /// Create an index on `label`/`property_key`.
    pub fn index_create(&self, label: LabelId, property_key: PropertyKeyId) -> Result<IndexDescriptor> {
        Ok(self
            .db
            .operations
            .index_create(&self.statement, label, property_key)?)
    }

    /// Drop a regular index.
    pub fn index_drop(&self, descriptor: &IndexDescriptor) -> Result<()> {
        Ok(self.db.operations.index_drop(&self.statement, descriptor)?)
    }

    /// Drop a constraint-backing index.
    pub fn unique_index_drop(&self, descriptor: &IndexDescriptor) -> Result<()> {
        Ok(self
            .db
            .operations
            .unique_index_drop(&self.statement, descriptor)?)
    }

    /// Create a uniqueness constraint on `label`/`property_key`.
    pub fn uniqueness_constraint_create(
        &self,
        label: LabelId,
        property_key: PropertyKeyId,
    ) -> Result<UniquenessConstraint> {
        Ok(self
            .db
            .operations
            .uniqueness_constraint_create(&self.statement, label, property_key)?)
    }

    /// Drop a uniqueness constraint.
    pub fn constraint_drop(&self, constraint: &UniquenessConstraint) -> Result<()> {
        Ok(self
            .db
            .operations
            .constraint_drop(&self.statement, constraint)?)
    }

    // ========================================================================
    // Schema reads
    // ========================================================================

    /// Regular indexes on `label`.
    pub fn indexes_get_for_label(&self, label: LabelId) -> Result<Vec<IndexDescriptor>> {
        Ok(self
            .db
            .operations
            .indexes_get_for_label(&self.statement, label)?)
    }

    /// The regular index on `label`/`property_key`.
    pub fn indexes_get_for_label_and_property_key(
        &self,
        label: LabelId,
        property_key: PropertyKeyId,
    ) -> Result<IndexDescriptor> {
        Ok(self.db.operations.indexes_get_for_label_and_property_key(
            &self.statement,
            label,
            property_key,
        )?)
    }

    /// All regular indexes.
    pub fn indexes_get_all(&self) -> Result<Vec<IndexDescriptor>> {
        Ok(self.db.operations.indexes_get_all(&self.statement)?)
    }

    /// Population state of an index.
    pub fn index_get_state(&self, descriptor: &IndexDescriptor) -> Result<InternalIndexState> {
        Ok(self
            .db
            .operations
            .index_get_state(&self.statement, descriptor)?)
    }

    /// Id of the constraint owning an index, if any.
    pub fn index_get_owning_uniqueness_constraint_id(
        &self,
        descriptor: &IndexDescriptor,
    ) -> Result<Option<u64>> {
        Ok(self
            .db
            .operations
            .index_get_owning_uniqueness_constraint_id(&self.statement, descriptor)?)
    }

    /// Committed rule id of an index.
    pub fn index_get_committed_id(&self, descriptor: &IndexDescriptor) -> Result<u64> {
        Ok(self
            .db
            .operations
            .index_get_committed_id(&self.statement, descriptor)?)
    }

    /// Population failure message of an index. Takes no lock.
    pub fn index_get_failure(&self, descriptor: &IndexDescriptor) -> Result<Option<String>> {
        Ok(self
            .db
            .operations
            .index_get_failure(&self.statement, descriptor)?)
    }

    /// Constraint-backing indexes on `label`.
    pub fn unique_indexes_get_for_label(&self, label: LabelId) -> Result<Vec<IndexDescriptor>> {
        Ok(self
            .db
            .operations
            .unique_indexes_get_for_label(&self.statement, label)?)
    }

    /// All constraint-backing indexes.
    pub fn unique_indexes_get_all(&self) -> Result<Vec<IndexDescriptor>> {
        Ok(self.db.operations.unique_indexes_get_all(&self.statement)?)
    }

    /// Constraints on `label`/`property_key`.
    pub fn constraints_get_for_label_and_property_key(
        &self,
        label: LabelId,
        property_key: PropertyKeyId,
    ) -> Result<Vec<UniquenessConstraint>> {
        Ok(self.db.operations.constraints_get_for_label_and_property_key(
            &self.statement,
            label,
            property_key,
        )?)
    }

    /// Constraints on `label`.
    pub fn constraints_get_for_label(&self, label: LabelId) -> Result<Vec<UniquenessConstraint>> {
        Ok(self
            .db
            .operations
            .constraints_get_for_label(&self.statement, label)?)
    }

    /// All constraints.
    pub fn constraints_get_all(&self) -> Result<Vec<UniquenessConstraint>> {
        Ok(self.db.operations.constraints_get_all(&self.statement)?)
    }

    // ========================================================================
    // Schema state
    // ========================================================================

    /// Cached value for `key`, computing it with `creator` on a miss.
    pub fn schema_state_get_or_create(
        &self,
        key: &SchemaStateKey,
        creator: impl Fn(&SchemaStateKey) -> SchemaStateValue,
    ) -> Result<SchemaStateValue> {
        Ok(self
            .db
            .operations
            .schema_state_get_or_create(&self.statement, key, &creator)?)
    }

    /// Typed variant of [`schema_state_get_or_create`](Self::schema_state_get_or_create).
    ///
    /// Returns `None` when the cached value has another type.
    pub fn schema_state_get_or_create_typed<V, F>(
        &self,
        key: &SchemaStateKey,
        creator: F,
    ) -> Result<Option<Arc<V>>>
    where
        V: Any + Send + Sync,
        F: Fn(&SchemaStateKey) -> V,
    {
        Ok(self
            .db
            .operations
            .schema_state_get_or_create_typed(&self.statement, key, creator)?)
    }

    /// Check whether a value is cached for `key`.
    pub fn schema_state_contains(&self, key: &SchemaStateKey) -> Result<bool> {
        Ok(self
            .db
            .operations
            .schema_state_contains(&self.statement, key)?)
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.locks.is_closed() {
            let released = self.locks.release_all();
            debug!(txn = self.id().0, released, "transaction dropped, rolled back");
        }
    }
}

impl std::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id())
            .field("closed", &self.locks.is_closed())
            .finish()
    }
}
