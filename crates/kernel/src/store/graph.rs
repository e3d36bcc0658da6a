//! In-memory entity store
//!
//! Nodes, relationships and graph properties behind one `RwLock`. Writes
//! are applied in place when the operation runs; there is no undo log, so
//! ending a transaction only releases its locks.
//!
//! Creation is not part of the entity write surface: a node or relationship
//! that has just been created is invisible to other transactions until its
//! id is handed out, so it needs no lock.
//!
//! ## Uniqueness
//!
//! `node_add_label` and `node_set_property` check every uniqueness
//! constraint on the affected labels against the other nodes and fail with
//! `ConstraintValidation` on a duplicate value.
//!
//! The store is also a schema-write delegate. It forwards to its
//! [`SchemaStore`] and, before a uniqueness constraint is created, checks
//! the existing nodes for duplicates (`CreateConstraintFailure`). The graph
//! lock is held across the check and the creation.

use crate::operations::{EntityWriteOperations, SchemaWriteOperations};
use crate::statement::KernelStatement;
use crate::store::SchemaStore;
use graphkern_core::{
    DefinedProperty, EntityError, EntityKind, IndexDescriptor, LabelId, NodeId, Property,
    PropertyKeyId, RelationshipId, SchemaWriteError, UniquenessConstraint, Value,
};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default, Clone)]
struct NodeRecord {
    labels: BTreeSet<LabelId>,
    properties: FxHashMap<PropertyKeyId, Value>,
}

#[derive(Debug, Clone)]
struct RelationshipRecord {
    start: NodeId,
    end: NodeId,
    properties: FxHashMap<PropertyKeyId, Value>,
}

#[derive(Debug, Default)]
struct GraphData {
    nodes: FxHashMap<NodeId, NodeRecord>,
    relationships: FxHashMap<RelationshipId, RelationshipRecord>,
    graph_properties: FxHashMap<PropertyKeyId, Value>,
}

impl GraphData {
    fn node(&self, id: NodeId) -> Result<&NodeRecord, EntityError> {
        self.nodes.get(&id).ok_or(EntityError::node_not_found(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeRecord, EntityError> {
        self.nodes.get_mut(&id).ok_or(EntityError::node_not_found(id))
    }

    fn relationship_mut(
        &mut self,
        id: RelationshipId,
    ) -> Result<&mut RelationshipRecord, EntityError> {
        self.relationships
            .get_mut(&id)
            .ok_or(EntityError::relationship_not_found(id))
    }

    /// Fail if another node with `constraint.label` already holds `value`
    fn check_unique(
        &self,
        node: NodeId,
        constraint: UniquenessConstraint,
        value: &Value,
    ) -> Result<(), EntityError> {
        let duplicate = self.nodes.iter().find(|(id, record)| {
            **id != node
                && record.labels.contains(&constraint.label)
                && record.properties.get(&constraint.property_key) == Some(value)
        });
        match duplicate {
            Some((existing, _)) => Err(EntityError::ConstraintValidation {
                constraint,
                existing: *existing,
                value: value.clone(),
            }),
            None => Ok(()),
        }
    }

    /// First two nodes under `constraint.label` sharing a value for its key
    fn find_duplicate(&self, constraint: UniquenessConstraint) -> Option<(NodeId, NodeId, Value)> {
        let mut seen: Vec<(NodeId, &Value)> = Vec::new();
        for (id, record) in &self.nodes {
            if !record.labels.contains(&constraint.label) {
                continue;
            }
            let Some(value) = record.properties.get(&constraint.property_key) else {
                continue;
            };
            if let Some((first, _)) = seen.iter().find(|(_, v)| *v == value) {
                return Some((*first, *id, value.clone()));
            }
            seen.push((*id, value));
        }
        None
    }
}

/// In-memory nodes, relationships and graph properties
#[derive(Debug)]
pub struct GraphStore {
    schema: Arc<SchemaStore>,
    data: RwLock<GraphData>,
    next_node_id: AtomicU64,
    next_relationship_id: AtomicU64,
}

impl GraphStore {
    /// Create an empty graph validating against `schema`
    pub fn new(schema: Arc<SchemaStore>) -> Self {
        GraphStore {
            schema,
            data: RwLock::new(GraphData::default()),
            next_node_id: AtomicU64::new(0),
            next_relationship_id: AtomicU64::new(0),
        }
    }

    /// Create a node with no labels or properties
    pub fn create_node(&self) -> NodeId {
        let id = NodeId::new(self.next_node_id.fetch_add(1, Ordering::SeqCst));
        self.data.write().nodes.insert(id, NodeRecord::default());
        id
    }

    /// Create a node with a caller-chosen id
    ///
    /// Returns `false` if the id is already taken, or is `u64::MAX`, which
    /// is never allocated. Later ids from [`GraphStore::create_node`] are
    /// allocated above it.
    pub fn create_node_with_id(&self, id: NodeId) -> bool {
        let Some(next) = id.as_u64().checked_add(1) else {
            return false;
        };
        self.next_node_id.fetch_max(next, Ordering::SeqCst);
        let mut data = self.data.write();
        if data.nodes.contains_key(&id) {
            return false;
        }
        data.nodes.insert(id, NodeRecord::default());
        true
    }

    /// Create a relationship between two existing nodes
    pub fn create_relationship(
        &self,
        start: NodeId,
        end: NodeId,
    ) -> Result<RelationshipId, EntityError> {
        let mut data = self.data.write();
        data.node(start)?;
        data.node(end)?;
        let id = RelationshipId::new(self.next_relationship_id.fetch_add(1, Ordering::SeqCst));
        data.relationships.insert(
            id,
            RelationshipRecord {
                start,
                end,
                properties: FxHashMap::default(),
            },
        );
        Ok(id)
    }

    /// Check whether a node exists
    pub fn node_exists(&self, id: NodeId) -> bool {
        self.data.read().nodes.contains_key(&id)
    }

    /// Check whether a relationship exists
    pub fn relationship_exists(&self, id: RelationshipId) -> bool {
        self.data.read().relationships.contains_key(&id)
    }

    /// Labels of a node, in label id order
    pub fn node_labels(&self, id: NodeId) -> Option<Vec<LabelId>> {
        self.data
            .read()
            .nodes
            .get(&id)
            .map(|record| record.labels.iter().copied().collect())
    }

    /// A node property value
    pub fn node_property(&self, id: NodeId, key: PropertyKeyId) -> Option<Value> {
        self.data
            .read()
            .nodes
            .get(&id)
            .and_then(|record| record.properties.get(&key).cloned())
    }

    /// A relationship property value
    pub fn relationship_property(&self, id: RelationshipId, key: PropertyKeyId) -> Option<Value> {
        self.data
            .read()
            .relationships
            .get(&id)
            .and_then(|record| record.properties.get(&key).cloned())
    }

    /// A graph property value
    pub fn graph_property(&self, key: PropertyKeyId) -> Option<Value> {
        self.data.read().graph_properties.get(&key).cloned()
    }

    /// Endpoints of a relationship
    pub fn relationship_endpoints(&self, id: RelationshipId) -> Option<(NodeId, NodeId)> {
        self.data
            .read()
            .relationships
            .get(&id)
            .map(|record| (record.start, record.end))
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.data.read().nodes.len()
    }
}

impl EntityWriteOperations for GraphStore {
    fn node_add_label(
        &self,
        _statement: &KernelStatement,
        node: NodeId,
        label: LabelId,
    ) -> Result<bool, EntityError> {
        let mut data = self.data.write();
        let record = data.node(node)?;
        if record.labels.contains(&label) {
            return Ok(false);
        }
        for constraint in self.schema.constraints_for_label(label) {
            if let Some(value) = record.properties.get(&constraint.property_key) {
                data.check_unique(node, constraint, value)?;
            }
        }
        data.node_mut(node)?.labels.insert(label);
        Ok(true)
    }

    fn node_remove_label(
        &self,
        _statement: &KernelStatement,
        node: NodeId,
        label: LabelId,
    ) -> Result<bool, EntityError> {
        Ok(self.data.write().node_mut(node)?.labels.remove(&label))
    }

    fn node_delete(&self, _statement: &KernelStatement, node: NodeId) -> Result<(), EntityError> {
        let mut data = self.data.write();
        data.node(node)?;
        if data
            .relationships
            .values()
            .any(|rel| rel.start == node || rel.end == node)
        {
            return Err(EntityError::InvalidOperation {
                kind: EntityKind::Node,
                id: node.as_u64(),
                reason: "node still has relationships".to_string(),
            });
        }
        data.nodes.remove(&node);
        Ok(())
    }

    fn relationship_delete(
        &self,
        _statement: &KernelStatement,
        relationship: RelationshipId,
    ) -> Result<(), EntityError> {
        self.data
            .write()
            .relationships
            .remove(&relationship)
            .map(|_| ())
            .ok_or(EntityError::relationship_not_found(relationship))
    }

    fn node_set_property(
        &self,
        _statement: &KernelStatement,
        node: NodeId,
        property: DefinedProperty,
    ) -> Result<Property, EntityError> {
        let mut data = self.data.write();
        let record = data.node(node)?;
        for label in &record.labels {
            if self.schema.has_constraint(*label, property.key) {
                let constraint = UniquenessConstraint::new(*label, property.key);
                data.check_unique(node, constraint, &property.value)?;
            }
        }
        let previous = data
            .node_mut(node)?
            .properties
            .insert(property.key, property.value);
        Ok(Property::from_previous(property.key, previous))
    }

    fn node_remove_property(
        &self,
        _statement: &KernelStatement,
        node: NodeId,
        key: PropertyKeyId,
    ) -> Result<Property, EntityError> {
        let previous = self.data.write().node_mut(node)?.properties.remove(&key);
        Ok(Property::from_previous(key, previous))
    }

    fn relationship_set_property(
        &self,
        _statement: &KernelStatement,
        relationship: RelationshipId,
        property: DefinedProperty,
    ) -> Result<Property, EntityError> {
        let previous = self
            .data
            .write()
            .relationship_mut(relationship)?
            .properties
            .insert(property.key, property.value);
        Ok(Property::from_previous(property.key, previous))
    }

    fn relationship_remove_property(
        &self,
        _statement: &KernelStatement,
        relationship: RelationshipId,
        key: PropertyKeyId,
    ) -> Result<Property, EntityError> {
        let previous = self
            .data
            .write()
            .relationship_mut(relationship)?
            .properties
            .remove(&key);
        Ok(Property::from_previous(key, previous))
    }

    fn graph_set_property(
        &self,
        _statement: &KernelStatement,
        property: DefinedProperty,
    ) -> Result<Property, EntityError> {
        let previous = self
            .data
            .write()
            .graph_properties
            .insert(property.key, property.value);
        Ok(Property::from_previous(property.key, previous))
    }

    fn graph_remove_property(
        &self,
        _statement: &KernelStatement,
        key: PropertyKeyId,
    ) -> Result<Property, EntityError> {
        let previous = self.data.write().graph_properties.remove(&key);
        Ok(Property::from_previous(key, previous))
    }
}

impl SchemaWriteOperations for GraphStore {
    fn index_create(
        &self,
        statement: &KernelStatement,
        label: LabelId,
        property_key: PropertyKeyId,
    ) -> Result<IndexDescriptor, SchemaWriteError> {
        self.schema.index_create(statement, label, property_key)
    }

    fn index_drop(
        &self,
        statement: &KernelStatement,
        descriptor: &IndexDescriptor,
    ) -> Result<(), SchemaWriteError> {
        self.schema.index_drop(statement, descriptor)
    }

    fn unique_index_drop(
        &self,
        statement: &KernelStatement,
        descriptor: &IndexDescriptor,
    ) -> Result<(), SchemaWriteError> {
        self.schema.unique_index_drop(statement, descriptor)
    }

    fn uniqueness_constraint_create(
        &self,
        statement: &KernelStatement,
        label: LabelId,
        property_key: PropertyKeyId,
    ) -> Result<UniquenessConstraint, SchemaWriteError> {
        let constraint = UniquenessConstraint::new(label, property_key);
        let data = self.data.read();
        if let Some((first, second, value)) = data.find_duplicate(constraint) {
            return Err(SchemaWriteError::CreateConstraintFailure {
                constraint,
                reason: format!("{} and {} both have value {}", first, second, value),
            });
        }
        let created = self
            .schema
            .uniqueness_constraint_create(statement, label, property_key);
        drop(data);
        created
    }

    fn constraint_drop(
        &self,
        statement: &KernelStatement,
        constraint: &UniquenessConstraint,
    ) -> Result<(), SchemaWriteError> {
        self.schema.constraint_drop(statement, constraint)
    }
}
