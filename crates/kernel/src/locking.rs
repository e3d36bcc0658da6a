//! Lock-before-access statement operations
//!
//! [`LockingOperations`] sits between a transaction's operation surface and
//! the storage implementations. Every operation does exactly two things:
//!
//! ```text
//! 1. acquire the lock named by KernelOperation::required_lock()
//!    through the statement's lock client (may block)
//! 2. call the delegate and return its result untouched
//! ```
//!
//! ## Lock Table
//!
//! | Operations | Lock |
//! |------------|------|
//! | node label add/remove, node delete, node property set/remove | NODE WRITE(node) |
//! | relationship delete, relationship property set/remove | RELATIONSHIP WRITE(relationship) |
//! | graph property set/remove | GRAPH WRITE |
//! | index/constraint create and drop | SCHEMA WRITE |
//! | schema reads, schema-state cache | SCHEMA READ |
//! | `index_get_failure` | none |
//!
//! All schema changes serialize on the single SCHEMA WRITE lock, whatever
//! label or property they touch.
//!
//! ## Failure Handling
//!
//! - Lock failure: the delegate is never called, the lock error is returned
//!   in the group error's `Lock` variant.
//! - Delegate failure: returned as is. The lock already granted stays held
//!   until the transaction ends; this layer never releases locks.
//!
//! Nothing is logged or retried here.

use crate::operations::{
    EntityWriteOperations, SchemaReadOperations, SchemaStateOperations, SchemaWriteOperations,
};
use crate::statement::KernelStatement;
use graphkern_core::{
    DefinedProperty, EntityError, IndexDescriptor, InternalIndexState, LabelId, LockError,
    LockRequest, NodeId, Property, PropertyKeyId, RelationshipId, SchemaReadError,
    SchemaStateKey, SchemaStateValue, SchemaWriteError, UniquenessConstraint,
};
use std::sync::Arc;

/// Every operation exposed by [`LockingOperations`], with the entity it targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelOperation {
    /// `node_add_label`
    NodeAddLabel(NodeId),
    /// `node_remove_label`
    NodeRemoveLabel(NodeId),
    /// `node_delete`
    NodeDelete(NodeId),
    /// `node_set_property`
    NodeSetProperty(NodeId),
    /// `node_remove_property`
    NodeRemoveProperty(NodeId),
    /// `relationship_delete`
    RelationshipDelete(RelationshipId),
    /// `relationship_set_property`
    RelationshipSetProperty(RelationshipId),
    /// `relationship_remove_property`
    RelationshipRemoveProperty(RelationshipId),
    /// `graph_set_property`
    GraphSetProperty,
    /// `graph_remove_property`
    GraphRemoveProperty,
    /// `index_create`
    IndexCreate,
    /// `index_drop`
    IndexDrop,
    /// `unique_index_drop`
    UniqueIndexDrop,
    /// `uniqueness_constraint_create`
    UniquenessConstraintCreate,
    /// `constraint_drop`
    ConstraintDrop,
    /// `indexes_get_for_label`
    IndexesGetForLabel,
    /// `indexes_get_for_label_and_property_key`
    IndexesGetForLabelAndPropertyKey,
    /// `indexes_get_all`
    IndexesGetAll,
    /// `index_get_state`
    IndexGetState,
    /// `index_get_owning_uniqueness_constraint_id`
    IndexGetOwningUniquenessConstraintId,
    /// `index_get_committed_id`
    IndexGetCommittedId,
    /// `index_get_failure`
    IndexGetFailure,
    /// `unique_indexes_get_for_label`
    UniqueIndexesGetForLabel,
    /// `unique_indexes_get_all`
    UniqueIndexesGetAll,
    /// `constraints_get_for_label_and_property_key`
    ConstraintsGetForLabelAndPropertyKey,
    /// `constraints_get_for_label`
    ConstraintsGetForLabel,
    /// `constraints_get_all`
    ConstraintsGetAll,
    /// `schema_state_get_or_create`
    SchemaStateGetOrCreate,
    /// `schema_state_contains`
    SchemaStateContains,
}

impl KernelOperation {
    /// The lock an operation must hold before its delegate runs
    ///
    /// `None` only for [`KernelOperation::IndexGetFailure`].
    pub fn required_lock(&self) -> Option<LockRequest> {
        use KernelOperation::*;
        match *self {
            NodeAddLabel(node)
            | NodeRemoveLabel(node)
            | NodeDelete(node)
            | NodeSetProperty(node)
            | NodeRemoveProperty(node) => Some(LockRequest::node_write(node)),

            RelationshipDelete(rel)
            | RelationshipSetProperty(rel)
            | RelationshipRemoveProperty(rel) => Some(LockRequest::relationship_write(rel)),

            GraphSetProperty | GraphRemoveProperty => Some(LockRequest::graph_write()),

            IndexCreate | IndexDrop | UniqueIndexDrop | UniquenessConstraintCreate
            | ConstraintDrop => Some(LockRequest::schema_write()),

            IndexesGetForLabel
            | IndexesGetForLabelAndPropertyKey
            | IndexesGetAll
            | IndexGetState
            | IndexGetOwningUniquenessConstraintId
            | IndexGetCommittedId
            | UniqueIndexesGetForLabel
            | UniqueIndexesGetAll
            | ConstraintsGetForLabelAndPropertyKey
            | ConstraintsGetForLabel
            | ConstraintsGetAll => Some(LockRequest::schema_read()),

            // Unlocked, unlike every other schema read. Whether SCHEMA READ
            // should guard it is unresolved; keep the asymmetry until it is.
            IndexGetFailure => None,

            SchemaStateGetOrCreate | SchemaStateContains => Some(LockRequest::schema_read()),
        }
    }
}

/// Acquire the lock required by `operation`
fn lock(statement: &KernelStatement, operation: KernelOperation) -> Result<(), LockError> {
    match operation.required_lock() {
        Some(request) => statement.locks().acquire(request),
        None => Ok(()),
    }
}

/// Statement operations guarded by transaction locks
///
/// Implements all four capability traits by locking, then delegating to the
/// injected implementations. Holds no state besides the delegates, so one
/// instance is shared by every transaction.
#[derive(Clone)]
pub struct LockingOperations {
    entity_write: Arc<dyn EntityWriteOperations>,
    schema_read: Arc<dyn SchemaReadOperations>,
    schema_write: Arc<dyn SchemaWriteOperations>,
    schema_state: Arc<dyn SchemaStateOperations>,
}

impl LockingOperations {
    /// Wrap the four delegates
    pub fn new(
        entity_write: Arc<dyn EntityWriteOperations>,
        schema_read: Arc<dyn SchemaReadOperations>,
        schema_write: Arc<dyn SchemaWriteOperations>,
        schema_state: Arc<dyn SchemaStateOperations>,
    ) -> Self {
        LockingOperations {
            entity_write,
            schema_read,
            schema_write,
            schema_state,
        }
    }
}

impl EntityWriteOperations for LockingOperations {
    fn node_add_label(
        &self,
        statement: &KernelStatement,
        node: NodeId,
        label: LabelId,
    ) -> Result<bool, EntityError> {
        lock(statement, KernelOperation::NodeAddLabel(node))?;
        self.entity_write.node_add_label(statement, node, label)
    }

    fn node_remove_label(
        &self,
        statement: &KernelStatement,
        node: NodeId,
        label: LabelId,
    ) -> Result<bool, EntityError> {
        lock(statement, KernelOperation::NodeRemoveLabel(node))?;
        self.entity_write.node_remove_label(statement, node, label)
    }

    fn node_delete(&self, statement: &KernelStatement, node: NodeId) -> Result<(), EntityError> {
        lock(statement, KernelOperation::NodeDelete(node))?;
        self.entity_write.node_delete(statement, node)
    }

    fn relationship_delete(
        &self,
        statement: &KernelStatement,
        relationship: RelationshipId,
    ) -> Result<(), EntityError> {
        lock(statement, KernelOperation::RelationshipDelete(relationship))?;
        self.entity_write.relationship_delete(statement, relationship)
    }

    fn node_set_property(
        &self,
        statement: &KernelStatement,
        node: NodeId,
        property: DefinedProperty,
    ) -> Result<Property, EntityError> {
        lock(statement, KernelOperation::NodeSetProperty(node))?;
        self.entity_write.node_set_property(statement, node, property)
    }

    fn node_remove_property(
        &self,
        statement: &KernelStatement,
        node: NodeId,
        key: PropertyKeyId,
    ) -> Result<Property, EntityError> {
        lock(statement, KernelOperation::NodeRemoveProperty(node))?;
        self.entity_write.node_remove_property(statement, node, key)
    }

    fn relationship_set_property(
        &self,
        statement: &KernelStatement,
        relationship: RelationshipId,
        property: DefinedProperty,
    ) -> Result<Property, EntityError> {
        lock(statement, KernelOperation::RelationshipSetProperty(relationship))?;
        self.entity_write
            .relationship_set_property(statement, relationship, property)
    }

    fn relationship_remove_property(
        &self,
        statement: &KernelStatement,
        relationship: RelationshipId,
        key: PropertyKeyId,
    ) -> Result<Property, EntityError> {
        lock(statement, KernelOperation::RelationshipRemoveProperty(relationship))?;
        self.entity_write
            .relationship_remove_property(statement, relationship, key)
    }

    fn graph_set_property(
        &self,
        statement: &KernelStatement,
        property: DefinedProperty,
    ) -> Result<Property, EntityError> {
        lock(statement, KernelOperation::GraphSetProperty)?;
        self.entity_write.graph_set_property(statement, property)
    }

    fn graph_remove_property(
        &self,
        statement: &KernelStatement,
        key: PropertyKeyId,
    ) -> Result<Property, EntityError> {
        lock(statement, KernelOperation::GraphRemoveProperty)?;
        self.entity_write.graph_remove_property(statement, key)
    }
}

impl SchemaWriteOperations for LockingOperations {
    fn index_create(
        &self,
        statement: &KernelStatement,
        label: LabelId,
        property_key: PropertyKeyId,
    ) -> Result<IndexDescriptor, SchemaWriteError> {
        lock(statement, KernelOperation::IndexCreate)?;
        self.schema_write.index_create(statement, label, property_key)
    }

    fn index_drop(
        &self,
        statement: &KernelStatement,
        descriptor: &IndexDescriptor,
    ) -> Result<(), SchemaWriteError> {
        lock(statement, KernelOperation::IndexDrop)?;
        self.schema_write.index_drop(statement, descriptor)
    }

    fn unique_index_drop(
        &self,
        statement: &KernelStatement,
        descriptor: &IndexDescriptor,
    ) -> Result<(), SchemaWriteError> {
        lock(statement, KernelOperation::UniqueIndexDrop)?;
        self.schema_write.unique_index_drop(statement, descriptor)
    }

    fn uniqueness_constraint_create(
        &self,
        statement: &KernelStatement,
        label: LabelId,
        property_key: PropertyKeyId,
    ) -> Result<UniquenessConstraint, SchemaWriteError> {
        lock(statement, KernelOperation::UniquenessConstraintCreate)?;
        self.schema_write
            .uniqueness_constraint_create(statement, label, property_key)
    }

    fn constraint_drop(
        &self,
        statement: &KernelStatement,
        constraint: &UniquenessConstraint,
    ) -> Result<(), SchemaWriteError> {
        lock(statement, KernelOperation::ConstraintDrop)?;
        self.schema_write.constraint_drop(statement, constraint)
    }
}

impl SchemaReadOperations for LockingOperations {
    fn indexes_get_for_label(
        &self,
        statement: &KernelStatement,
        label: LabelId,
    ) -> Result<Vec<IndexDescriptor>, SchemaReadError> {
        lock(statement, KernelOperation::IndexesGetForLabel)?;
        self.schema_read.indexes_get_for_label(statement, label)
    }

    fn indexes_get_for_label_and_property_key(
        &self,
        statement: &KernelStatement,
        label: LabelId,
        property_key: PropertyKeyId,
    ) -> Result<IndexDescriptor, SchemaReadError> {
        lock(statement, KernelOperation::IndexesGetForLabelAndPropertyKey)?;
        self.schema_read
            .indexes_get_for_label_and_property_key(statement, label, property_key)
    }

    fn indexes_get_all(
        &self,
        statement: &KernelStatement,
    ) -> Result<Vec<IndexDescriptor>, SchemaReadError> {
        lock(statement, KernelOperation::IndexesGetAll)?;
        self.schema_read.indexes_get_all(statement)
    }

    fn index_get_state(
        &self,
        statement: &KernelStatement,
        descriptor: &IndexDescriptor,
    ) -> Result<InternalIndexState, SchemaReadError> {
        lock(statement, KernelOperation::IndexGetState)?;
        self.schema_read.index_get_state(statement, descriptor)
    }

    fn index_get_owning_uniqueness_constraint_id(
        &self,
        statement: &KernelStatement,
        descriptor: &IndexDescriptor,
    ) -> Result<Option<u64>, SchemaReadError> {
        lock(statement, KernelOperation::IndexGetOwningUniquenessConstraintId)?;
        self.schema_read
            .index_get_owning_uniqueness_constraint_id(statement, descriptor)
    }

    fn index_get_committed_id(
        &self,
        statement: &KernelStatement,
        descriptor: &IndexDescriptor,
    ) -> Result<u64, SchemaReadError> {
        lock(statement, KernelOperation::IndexGetCommittedId)?;
        self.schema_read.index_get_committed_id(statement, descriptor)
    }

    fn index_get_failure(
        &self,
        statement: &KernelStatement,
        descriptor: &IndexDescriptor,
    ) -> Result<Option<String>, SchemaReadError> {
        // No lock: see KernelOperation::IndexGetFailure.
        self.schema_read.index_get_failure(statement, descriptor)
    }

    fn unique_indexes_get_for_label(
        &self,
        statement: &KernelStatement,
        label: LabelId,
    ) -> Result<Vec<IndexDescriptor>, SchemaReadError> {
        lock(statement, KernelOperation::UniqueIndexesGetForLabel)?;
        self.schema_read.unique_indexes_get_for_label(statement, label)
    }

    fn unique_indexes_get_all(
        &self,
        statement: &KernelStatement,
    ) -> Result<Vec<IndexDescriptor>, SchemaReadError> {
        lock(statement, KernelOperation::UniqueIndexesGetAll)?;
        self.schema_read.unique_indexes_get_all(statement)
    }

    fn constraints_get_for_label_and_property_key(
        &self,
        statement: &KernelStatement,
        label: LabelId,
        property_key: PropertyKeyId,
    ) -> Result<Vec<UniquenessConstraint>, SchemaReadError> {
        lock(statement, KernelOperation::ConstraintsGetForLabelAndPropertyKey)?;
        self.schema_read
            .constraints_get_for_label_and_property_key(statement, label, property_key)
    }

    fn constraints_get_for_label(
        &self,
        statement: &KernelStatement,
        label: LabelId,
    ) -> Result<Vec<UniquenessConstraint>, SchemaReadError> {
        lock(statement, KernelOperation::ConstraintsGetForLabel)?;
        self.schema_read.constraints_get_for_label(statement, label)
    }

    fn constraints_get_all(
        &self,
        statement: &KernelStatement,
    ) -> Result<Vec<UniquenessConstraint>, SchemaReadError> {
        lock(statement, KernelOperation::ConstraintsGetAll)?;
        self.schema_read.constraints_get_all(statement)
    }
}

impl SchemaStateOperations for LockingOperations {
    fn schema_state_get_or_create(
        &self,
        statement: &KernelStatement,
        key: &SchemaStateKey,
        creator: &dyn Fn(&SchemaStateKey) -> SchemaStateValue,
    ) -> Result<SchemaStateValue, LockError> {
        lock(statement, KernelOperation::SchemaStateGetOrCreate)?;
        self.schema_state
            .schema_state_get_or_create(statement, key, creator)
    }

    fn schema_state_contains(
        &self,
        statement: &KernelStatement,
        key: &SchemaStateKey,
    ) -> Result<bool, LockError> {
        lock(statement, KernelOperation::SchemaStateContains)?;
        self.schema_state.schema_state_contains(statement, key)
    }
}
