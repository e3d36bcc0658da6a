//! Kernel capability groups
//!
//! The kernel's operation surface is split into four narrow traits. Storage
//! implementations provide them; [`crate::LockingOperations`] wraps one of
//! each and adds the lock precondition.
//!
//! | Trait | Operations |
//! |-------|------------|
//! | [`EntityWriteOperations`] | label add/remove, node/relationship delete, property set/remove |
//! | [`SchemaReadOperations`] | index and constraint lookups |
//! | [`SchemaWriteOperations`] | index and constraint create/drop |
//! | [`SchemaStateOperations`] | schema-derived cache |
//!
//! Every method takes the [`KernelStatement`] of the calling transaction.

use crate::statement::KernelStatement;
use graphkern_core::{
    DefinedProperty, EntityError, IndexDescriptor, InternalIndexState, LabelId, LockError, NodeId,
    Property, PropertyKeyId, RelationshipId, SchemaReadError, SchemaStateKey, SchemaStateValue,
    SchemaWriteError, UniquenessConstraint,
};
use std::any::Any;
use std::sync::Arc;

/// Mutation of nodes, relationships and graph properties
pub trait EntityWriteOperations: Send + Sync {
    /// Add a label to a node. Returns `false` if the node already had it.
    fn node_add_label(
        &self,
        statement: &KernelStatement,
        node: NodeId,
        label: LabelId,
    ) -> Result<bool, EntityError>;

    /// Remove a label from a node. Returns `false` if the node did not have it.
    fn node_remove_label(
        &self,
        statement: &KernelStatement,
        node: NodeId,
        label: LabelId,
    ) -> Result<bool, EntityError>;

    /// Delete a node
    fn node_delete(&self, statement: &KernelStatement, node: NodeId) -> Result<(), EntityError>;

    /// Delete a relationship
    fn relationship_delete(
        &self,
        statement: &KernelStatement,
        relationship: RelationshipId,
    ) -> Result<(), EntityError>;

    /// Set a node property, returning the previous state of the key
    fn node_set_property(
        &self,
        statement: &KernelStatement,
        node: NodeId,
        property: DefinedProperty,
    ) -> Result<Property, EntityError>;

    /// Remove a node property, returning the previous state of the key
    fn node_remove_property(
        &self,
        statement: &KernelStatement,
        node: NodeId,
        key: PropertyKeyId,
    ) -> Result<Property, EntityError>;

    /// Set a relationship property, returning the previous state of the key
    fn relationship_set_property(
        &self,
        statement: &KernelStatement,
        relationship: RelationshipId,
        property: DefinedProperty,
    ) -> Result<Property, EntityError>;

    /// Remove a relationship property, returning the previous state of the key
    fn relationship_remove_property(
        &self,
        statement: &KernelStatement,
        relationship: RelationshipId,
        key: PropertyKeyId,
    ) -> Result<Property, EntityError>;

    /// Set a graph property, returning the previous state of the key
    fn graph_set_property(
        &self,
        statement: &KernelStatement,
        property: DefinedProperty,
    ) -> Result<Property, EntityError>;

    /// Remove a graph property, returning the previous state of the key
    fn graph_remove_property(
        &self,
        statement: &KernelStatement,
        key: PropertyKeyId,
    ) -> Result<Property, EntityError>;
}

/// Schema lookups
///
/// "Indexes" are regular indexes; "unique indexes" are the indexes owned by
/// uniqueness constraints. State, owner, committed id and failure lookups
/// accept either kind.
pub trait SchemaReadOperations: Send + Sync {
    /// Regular indexes on a label
    fn indexes_get_for_label(
        &self,
        statement: &KernelStatement,
        label: LabelId,
    ) -> Result<Vec<IndexDescriptor>, SchemaReadError>;

    /// The regular index on (label, property key)
    fn indexes_get_for_label_and_property_key(
        &self,
        statement: &KernelStatement,
        label: LabelId,
        property_key: PropertyKeyId,
    ) -> Result<IndexDescriptor, SchemaReadError>;

    /// All regular indexes
    fn indexes_get_all(
        &self,
        statement: &KernelStatement,
    ) -> Result<Vec<IndexDescriptor>, SchemaReadError>;

    /// Population state of an index
    fn index_get_state(
        &self,
        statement: &KernelStatement,
        descriptor: &IndexDescriptor,
    ) -> Result<InternalIndexState, SchemaReadError>;

    /// Id of the constraint owning an index, if any
    fn index_get_owning_uniqueness_constraint_id(
        &self,
        statement: &KernelStatement,
        descriptor: &IndexDescriptor,
    ) -> Result<Option<u64>, SchemaReadError>;

    /// Committed schema rule id of an index
    fn index_get_committed_id(
        &self,
        statement: &KernelStatement,
        descriptor: &IndexDescriptor,
    ) -> Result<u64, SchemaReadError>;

    /// Failure description of an index, `None` unless the index has failed
    fn index_get_failure(
        &self,
        statement: &KernelStatement,
        descriptor: &IndexDescriptor,
    ) -> Result<Option<String>, SchemaReadError>;

    /// Unique indexes on a label
    fn unique_indexes_get_for_label(
        &self,
        statement: &KernelStatement,
        label: LabelId,
    ) -> Result<Vec<IndexDescriptor>, SchemaReadError>;

    /// All unique indexes
    fn unique_indexes_get_all(
        &self,
        statement: &KernelStatement,
    ) -> Result<Vec<IndexDescriptor>, SchemaReadError>;

    /// Constraints on (label, property key)
    fn constraints_get_for_label_and_property_key(
        &self,
        statement: &KernelStatement,
        label: LabelId,
        property_key: PropertyKeyId,
    ) -> Result<Vec<UniquenessConstraint>, SchemaReadError>;

    /// Constraints on a label
    fn constraints_get_for_label(
        &self,
        statement: &KernelStatement,
        label: LabelId,
    ) -> Result<Vec<UniquenessConstraint>, SchemaReadError>;

    /// All constraints
    fn constraints_get_all(
        &self,
        statement: &KernelStatement,
    ) -> Result<Vec<UniquenessConstraint>, SchemaReadError>;
}

/// Schema changes
pub trait SchemaWriteOperations: Send + Sync {
    /// Create a regular index
    fn index_create(
        &self,
        statement: &KernelStatement,
        label: LabelId,
        property_key: PropertyKeyId,
    ) -> Result<IndexDescriptor, SchemaWriteError>;

    /// Drop a regular index
    fn index_drop(
        &self,
        statement: &KernelStatement,
        descriptor: &IndexDescriptor,
    ) -> Result<(), SchemaWriteError>;

    /// Drop a unique index
    fn unique_index_drop(
        &self,
        statement: &KernelStatement,
        descriptor: &IndexDescriptor,
    ) -> Result<(), SchemaWriteError>;

    /// Create a uniqueness constraint and its backing unique index
    fn uniqueness_constraint_create(
        &self,
        statement: &KernelStatement,
        label: LabelId,
        property_key: PropertyKeyId,
    ) -> Result<UniquenessConstraint, SchemaWriteError>;

    /// Drop a uniqueness constraint and its backing unique index
    fn constraint_drop(
        &self,
        statement: &KernelStatement,
        constraint: &UniquenessConstraint,
    ) -> Result<(), SchemaWriteError>;
}

/// Schema-derived value cache
pub trait SchemaStateOperations: Send + Sync {
    /// Cached value for `key`, computing it with `creator` when absent
    fn schema_state_get_or_create(
        &self,
        statement: &KernelStatement,
        key: &SchemaStateKey,
        creator: &dyn Fn(&SchemaStateKey) -> SchemaStateValue,
    ) -> Result<SchemaStateValue, LockError>;

    /// Whether a value is cached for `key`
    fn schema_state_contains(
        &self,
        statement: &KernelStatement,
        key: &SchemaStateKey,
    ) -> Result<bool, LockError>;
}

/// Typed access to the schema-state cache
pub trait SchemaStateExt: SchemaStateOperations {
    /// Like [`SchemaStateOperations::schema_state_get_or_create`], downcasting
    /// the cached value to `V`. Returns `None` when the entry holds another type.
    fn schema_state_get_or_create_typed<V, F>(
        &self,
        statement: &KernelStatement,
        key: &SchemaStateKey,
        creator: F,
    ) -> Result<Option<Arc<V>>, LockError>
    where
        V: Any + Send + Sync,
        F: Fn(&SchemaStateKey) -> V,
    {
        let create = |key: &SchemaStateKey| -> SchemaStateValue { Arc::new(creator(key)) };
        let value = self.schema_state_get_or_create(statement, key, &create)?;
        Ok(value.downcast::<V>().ok())
    }
}

impl<T: SchemaStateOperations + ?Sized> SchemaStateExt for T {}
