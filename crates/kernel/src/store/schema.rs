//! In-memory schema store
//!
//! Holds index and uniqueness-constraint rules. Every rule gets a rule id
//! from a monotonically increasing counter; a constraint owns the unique
//! index created alongside it.
//!
//! ## Index Kinds
//!
//! - Regular index: created by `index_create`, dropped by `index_drop`
//! - Unique index: created by `uniqueness_constraint_create`, owned by the
//!   constraint, dropped by `constraint_drop` or `unique_index_drop`
//!
//! A (label, property key) pair has at most one index of either kind.
//!
//! ## Population
//!
//! Regular indexes start `Populating`. Whoever builds the index moves it
//! to `Online` or `Failed` with [`SchemaStore::set_index_online`] and
//! [`SchemaStore::set_index_failed`]. Unique indexes are `Online` as soon as
//! the constraint exists.
//!
//! The store sees no graph data, so it cannot check a new constraint against
//! existing nodes. [`crate::GraphStore`] does that and forwards here.

use crate::operations::{SchemaReadOperations, SchemaWriteOperations};
use crate::statement::KernelStatement;
use graphkern_core::{
    IndexDescriptor, InternalIndexState, LabelId, PropertyKeyId, SchemaReadError,
    SchemaWriteError, UniquenessConstraint,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct IndexRule {
    id: u64,
    state: InternalIndexState,
    failure: Option<String>,
    owning_constraint: Option<u64>,
}

impl IndexRule {
    fn is_unique(&self) -> bool {
        self.owning_constraint.is_some()
    }
}

#[derive(Debug, Default)]
struct SchemaRules {
    indexes: BTreeMap<IndexDescriptor, IndexRule>,
    constraints: BTreeMap<UniquenessConstraint, u64>,
}

impl SchemaRules {
    fn indexes_where(&self, pred: impl Fn(&IndexDescriptor, &IndexRule) -> bool) -> Vec<IndexDescriptor> {
        self.indexes
            .iter()
            .filter(|(descriptor, rule)| pred(descriptor, rule))
            .map(|(descriptor, _)| *descriptor)
            .collect()
    }

    fn rule(&self, descriptor: &IndexDescriptor) -> Option<&IndexRule> {
        self.indexes.get(descriptor)
    }
}

/// In-memory schema rules
#[derive(Debug)]
pub struct SchemaStore {
    rules: RwLock<SchemaRules>,
    next_rule_id: AtomicU64,
}

impl SchemaStore {
    /// Create an empty schema
    pub fn new() -> Self {
        SchemaStore {
            rules: RwLock::new(SchemaRules::default()),
            next_rule_id: AtomicU64::new(1),
        }
    }

    fn allocate_rule_id(&self) -> u64 {
        self.next_rule_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Mark an index as online. Returns `false` if the index does not exist.
    pub fn set_index_online(&self, descriptor: &IndexDescriptor) -> bool {
        match self.rules.write().indexes.get_mut(descriptor) {
            Some(rule) => {
                rule.state = InternalIndexState::Online;
                rule.failure = None;
                debug!(%descriptor, "index online");
                true
            }
            None => false,
        }
    }

    /// Mark an index as failed with a description of the failure.
    /// Returns `false` if the index does not exist.
    pub fn set_index_failed(&self, descriptor: &IndexDescriptor, reason: impl Into<String>) -> bool {
        match self.rules.write().indexes.get_mut(descriptor) {
            Some(rule) => {
                let reason = reason.into();
                warn!(%descriptor, reason = %reason, "index population failed");
                rule.state = InternalIndexState::Failed;
                rule.failure = Some(reason);
                true
            }
            None => false,
        }
    }

    /// Constraints on a label
    ///
    /// Used by entity writes to validate uniqueness; takes no locks.
    pub fn constraints_for_label(&self, label: LabelId) -> Vec<UniquenessConstraint> {
        self.rules
            .read()
            .constraints
            .keys()
            .filter(|c| c.label == label)
            .copied()
            .collect()
    }

    /// Check whether a uniqueness constraint exists on (label, property key)
    pub fn has_constraint(&self, label: LabelId, property_key: PropertyKeyId) -> bool {
        self.rules
            .read()
            .constraints
            .contains_key(&UniquenessConstraint::new(label, property_key))
    }
}

impl Default for SchemaStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaWriteOperations for SchemaStore {
    fn index_create(
        &self,
        _statement: &KernelStatement,
        label: LabelId,
        property_key: PropertyKeyId,
    ) -> Result<IndexDescriptor, SchemaWriteError> {
        let descriptor = IndexDescriptor::new(label, property_key);
        let mut rules = self.rules.write();

        let constraint = UniquenessConstraint::new(label, property_key);
        if rules.constraints.contains_key(&constraint) {
            return Err(SchemaWriteError::AlreadyConstrained(constraint));
        }
        if rules.indexes.contains_key(&descriptor) {
            return Err(SchemaWriteError::AlreadyIndexed(descriptor));
        }

        let id = self.allocate_rule_id();
        rules.indexes.insert(
            descriptor,
            IndexRule {
                id,
                state: InternalIndexState::Populating,
                failure: None,
                owning_constraint: None,
            },
        );
        debug!(%descriptor, rule_id = id, "index created");
        Ok(descriptor)
    }

    fn index_drop(
        &self,
        _statement: &KernelStatement,
        descriptor: &IndexDescriptor,
    ) -> Result<(), SchemaWriteError> {
        let mut rules = self.rules.write();
        match rules.rule(descriptor).map(IndexRule::is_unique) {
            None => Err(SchemaWriteError::DropIndexFailure {
                descriptor: *descriptor,
                reason: "no such index".to_string(),
            }),
            Some(true) => Err(SchemaWriteError::DropIndexFailure {
                descriptor: *descriptor,
                reason: "index belongs to a uniqueness constraint".to_string(),
            }),
            Some(false) => {
                rules.indexes.remove(descriptor);
                debug!(%descriptor, "index dropped");
                Ok(())
            }
        }
    }

    fn unique_index_drop(
        &self,
        _statement: &KernelStatement,
        descriptor: &IndexDescriptor,
    ) -> Result<(), SchemaWriteError> {
        let mut rules = self.rules.write();
        match rules.rule(descriptor).map(IndexRule::is_unique) {
            Some(true) => {
                rules.indexes.remove(descriptor);
                debug!(%descriptor, "unique index dropped");
                Ok(())
            }
            Some(false) => Err(SchemaWriteError::DropIndexFailure {
                descriptor: *descriptor,
                reason: "not a unique index".to_string(),
            }),
            None => Err(SchemaWriteError::DropIndexFailure {
                descriptor: *descriptor,
                reason: "no such index".to_string(),
            }),
        }
    }

    fn uniqueness_constraint_create(
        &self,
        _statement: &KernelStatement,
        label: LabelId,
        property_key: PropertyKeyId,
    ) -> Result<UniquenessConstraint, SchemaWriteError> {
        let constraint = UniquenessConstraint::new(label, property_key);
        let mut rules = self.rules.write();

        if rules.constraints.contains_key(&constraint) {
            return Err(SchemaWriteError::AlreadyConstrained(constraint));
        }
        if let Some(existing) = rules.rule(&constraint.index()) {
            if existing.is_unique() {
                return Err(SchemaWriteError::CreateConstraintFailure {
                    constraint,
                    reason: "a unique index without constraint exists".to_string(),
                });
            }
            return Err(SchemaWriteError::AlreadyIndexed(constraint.index()));
        }

        let constraint_id = self.allocate_rule_id();
        let index_id = self.allocate_rule_id();
        rules.constraints.insert(constraint, constraint_id);
        rules.indexes.insert(
            constraint.index(),
            IndexRule {
                id: index_id,
                state: InternalIndexState::Online,
                failure: None,
                owning_constraint: Some(constraint_id),
            },
        );
        debug!(%constraint, constraint_id, index_id, "uniqueness constraint created");
        Ok(constraint)
    }

    fn constraint_drop(
        &self,
        _statement: &KernelStatement,
        constraint: &UniquenessConstraint,
    ) -> Result<(), SchemaWriteError> {
        let mut rules = self.rules.write();
        let Some(constraint_id) = rules.constraints.remove(constraint) else {
            return Err(SchemaWriteError::DropConstraintFailure {
                constraint: *constraint,
                reason: "no such constraint".to_string(),
            });
        };
        let index = constraint.index();
        if rules
            .rule(&index)
            .map(|rule| rule.owning_constraint == Some(constraint_id))
            .unwrap_or(false)
        {
            rules.indexes.remove(&index);
        }
        debug!(%constraint, "uniqueness constraint dropped");
        Ok(())
    }
}

impl SchemaReadOperations for SchemaStore {
    fn indexes_get_for_label(
        &self,
        _statement: &KernelStatement,
        label: LabelId,
    ) -> Result<Vec<IndexDescriptor>, SchemaReadError> {
        Ok(self
            .rules
            .read()
            .indexes_where(|d, rule| d.label == label && !rule.is_unique()))
    }

    fn indexes_get_for_label_and_property_key(
        &self,
        _statement: &KernelStatement,
        label: LabelId,
        property_key: PropertyKeyId,
    ) -> Result<IndexDescriptor, SchemaReadError> {
        let descriptor = IndexDescriptor::new(label, property_key);
        match self.rules.read().rule(&descriptor) {
            Some(rule) if !rule.is_unique() => Ok(descriptor),
            _ => Err(SchemaReadError::SchemaRuleNotFound(descriptor.to_string())),
        }
    }

    fn indexes_get_all(
        &self,
        _statement: &KernelStatement,
    ) -> Result<Vec<IndexDescriptor>, SchemaReadError> {
        Ok(self.rules.read().indexes_where(|_, rule| !rule.is_unique()))
    }

    fn index_get_state(
        &self,
        _statement: &KernelStatement,
        descriptor: &IndexDescriptor,
    ) -> Result<InternalIndexState, SchemaReadError> {
        self.rules
            .read()
            .rule(descriptor)
            .map(|rule| rule.state)
            .ok_or(SchemaReadError::IndexNotFound(*descriptor))
    }

    fn index_get_owning_uniqueness_constraint_id(
        &self,
        _statement: &KernelStatement,
        descriptor: &IndexDescriptor,
    ) -> Result<Option<u64>, SchemaReadError> {
        self.rules
            .read()
            .rule(descriptor)
            .map(|rule| rule.owning_constraint)
            .ok_or_else(|| SchemaReadError::SchemaRuleNotFound(descriptor.to_string()))
    }

    fn index_get_committed_id(
        &self,
        _statement: &KernelStatement,
        descriptor: &IndexDescriptor,
    ) -> Result<u64, SchemaReadError> {
        self.rules
            .read()
            .rule(descriptor)
            .map(|rule| rule.id)
            .ok_or_else(|| SchemaReadError::SchemaRuleNotFound(descriptor.to_string()))
    }

    fn index_get_failure(
        &self,
        _statement: &KernelStatement,
        descriptor: &IndexDescriptor,
    ) -> Result<Option<String>, SchemaReadError> {
        self.rules
            .read()
            .rule(descriptor)
            .map(|rule| rule.failure.clone())
            .ok_or(SchemaReadError::IndexNotFound(*descriptor))
    }

    fn unique_indexes_get_for_label(
        &self,
        _statement: &KernelStatement,
        label: LabelId,
    ) -> Result<Vec<IndexDescriptor>, SchemaReadError> {
        Ok(self
            .rules
            .read()
            .indexes_where(|d, rule| d.label == label && rule.is_unique()))
    }

    fn unique_indexes_get_all(
        &self,
        _statement: &KernelStatement,
    ) -> Result<Vec<IndexDescriptor>, SchemaReadError> {
        Ok(self.rules.read().indexes_where(|_, rule| rule.is_unique()))
    }

    fn constraints_get_for_label_and_property_key(
        &self,
        _statement: &KernelStatement,
        label: LabelId,
        property_key: PropertyKeyId,
    ) -> Result<Vec<UniquenessConstraint>, SchemaReadError> {
        Ok(self
            .rules
            .read()
            .constraints
            .keys()
            .filter(|c| c.matches(label, property_key))
            .copied()
            .collect())
    }

    fn constraints_get_for_label(
        &self,
        _statement: &KernelStatement,
        label: LabelId,
    ) -> Result<Vec<UniquenessConstraint>, SchemaReadError> {
        Ok(self.constraints_for_label(label))
    }

    fn constraints_get_all(
        &self,
        _statement: &KernelStatement,
    ) -> Result<Vec<UniquenessConstraint>, SchemaReadError> {
        Ok(self.rules.read().constraints.keys().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::statement;

    const PERSON: LabelId = LabelId(1);
    const NAME: PropertyKeyId = PropertyKeyId(1);
    const AGE: PropertyKeyId = PropertyKeyId(2);

    #[test]
    fn test_index_create_and_lookup() {
        let store = SchemaStore::new();
        let stmt = statement();
        let index = store.index_create(&stmt, PERSON, NAME).unwrap();

        assert_eq!(store.indexes_get_all(&stmt).unwrap(), vec![index]);
        assert_eq!(store.indexes_get_for_label(&stmt, PERSON).unwrap(), vec![index]);
        assert!(store.indexes_get_for_label(&stmt, LabelId(9)).unwrap().is_empty());
        assert_eq!(
            store
                .indexes_get_for_label_and_property_key(&stmt, PERSON, NAME)
                .unwrap(),
            index
        );
        assert_eq!(
            store.index_get_state(&stmt, &index).unwrap(),
            InternalIndexState::Populating
        );
        assert_eq!(
            store
                .index_get_owning_uniqueness_constraint_id(&stmt, &index)
                .unwrap(),
            None
        );
        assert!(store.unique_indexes_get_all(&stmt).unwrap().is_empty());
    }

    #[test]
    fn test_index_create_twice_fails() {
        let store = SchemaStore::new();
        let stmt = statement();
        let index = store.index_create(&stmt, PERSON, NAME).unwrap();
        assert_eq!(
            store.index_create(&stmt, PERSON, NAME).unwrap_err(),
            SchemaWriteError::AlreadyIndexed(index)
        );
    }

    #[test]
    fn test_index_create_on_constrained_pair_fails() {
        let store = SchemaStore::new();
        let stmt = statement();
        let c = store.uniqueness_constraint_create(&stmt, PERSON, NAME).unwrap();
        assert_eq!(
            store.index_create(&stmt, PERSON, NAME).unwrap_err(),
            SchemaWriteError::AlreadyConstrained(c)
        );
    }

    #[test]
    fn test_constraint_on_indexed_pair_fails() {
        let store = SchemaStore::new();
        let stmt = statement();
        let index = store.index_create(&stmt, PERSON, NAME).unwrap();
        assert_eq!(
            store
                .uniqueness_constraint_create(&stmt, PERSON, NAME)
                .unwrap_err(),
            SchemaWriteError::AlreadyIndexed(index)
        );
    }

    #[test]
    fn test_constraint_owns_unique_index() {
        let store = SchemaStore::new();
        let stmt = statement();
        let c = store.uniqueness_constraint_create(&stmt, PERSON, NAME).unwrap();
        let index = c.index();

        assert_eq!(store.unique_indexes_get_all(&stmt).unwrap(), vec![index]);
        assert_eq!(
            store.unique_indexes_get_for_label(&stmt, PERSON).unwrap(),
            vec![index]
        );
        assert!(store.indexes_get_all(&stmt).unwrap().is_empty());
        assert!(matches!(
            store.indexes_get_for_label_and_property_key(&stmt, PERSON, NAME),
            Err(SchemaReadError::SchemaRuleNotFound(_))
        ));

        let owner = store
            .index_get_owning_uniqueness_constraint_id(&stmt, &index)
            .unwrap();
        assert!(owner.is_some());
        assert_ne!(owner, Some(store.index_get_committed_id(&stmt, &index).unwrap()));
        assert_eq!(
            store.index_get_state(&stmt, &index).unwrap(),
            InternalIndexState::Online
        );

        assert_eq!(
            store
                .constraints_get_for_label_and_property_key(&stmt, PERSON, NAME)
                .unwrap(),
            vec![c]
        );
        assert!(store
            .constraints_get_for_label_and_property_key(&stmt, PERSON, AGE)
            .unwrap()
            .is_empty());
        assert_eq!(store.constraints_get_for_label(&stmt, PERSON).unwrap(), vec![c]);
        assert_eq!(store.constraints_get_all(&stmt).unwrap(), vec![c]);
    }

    #[test]
    fn test_constraint_create_twice_fails() {
        let store = SchemaStore::new();
        let stmt = statement();
        let c = store.uniqueness_constraint_create(&stmt, PERSON, NAME).unwrap();
        assert_eq!(
            store
                .uniqueness_constraint_create(&stmt, PERSON, NAME)
                .unwrap_err(),
            SchemaWriteError::AlreadyConstrained(c)
        );
    }

    #[test]
    fn test_index_drop_rules() {
        let store = SchemaStore::new();
        let stmt = statement();
        let index = store.index_create(&stmt, PERSON, AGE).unwrap();
        let c = store.uniqueness_constraint_create(&stmt, PERSON, NAME).unwrap();

        assert!(matches!(
            store.index_drop(&stmt, &c.index()),
            Err(SchemaWriteError::DropIndexFailure { .. })
        ));
        assert!(matches!(
            store.unique_index_drop(&stmt, &index),
            Err(SchemaWriteError::DropIndexFailure { .. })
        ));

        store.index_drop(&stmt, &index).unwrap();
        assert!(matches!(
            store.index_drop(&stmt, &index),
            Err(SchemaWriteError::DropIndexFailure { .. })
        ));

        store.unique_index_drop(&stmt, &c.index()).unwrap();
        assert!(store.unique_indexes_get_all(&stmt).unwrap().is_empty());
    }

    #[test]
    fn test_constraint_drop_removes_index() {
        let store = SchemaStore::new();
        let stmt = statement();
        let c = store.uniqueness_constraint_create(&stmt, PERSON, NAME).unwrap();
        store.constraint_drop(&stmt, &c).unwrap();

        assert!(store.constraints_get_all(&stmt).unwrap().is_empty());
        assert!(store.unique_indexes_get_all(&stmt).unwrap().is_empty());
        assert_eq!(
            store.constraint_drop(&stmt, &c).unwrap_err(),
            SchemaWriteError::DropConstraintFailure {
                constraint: c,
                reason: "no such constraint".to_string()
            }
        );
    }

    #[test]
    fn test_failure_description() {
        let store = SchemaStore::new();
        let stmt = statement();
        let index = store.index_create(&stmt, PERSON, NAME).unwrap();
        assert_eq!(store.index_get_failure(&stmt, &index).unwrap(), None);

        assert!(store.set_index_failed(&index, "out of disk"));
        assert_eq!(
            store.index_get_state(&stmt, &index).unwrap(),
            InternalIndexState::Failed
        );
        assert_eq!(
            store.index_get_failure(&stmt, &index).unwrap(),
            Some("out of disk".to_string())
        );

        let missing = IndexDescriptor::new(LabelId(7), NAME);
        assert_eq!(
            store.index_get_failure(&stmt, &missing).unwrap_err(),
            SchemaReadError::IndexNotFound(missing)
        );
        assert!(!store.set_index_failed(&missing, "x"));
    }

    #[test]
    fn test_set_online() {
        let store = SchemaStore::new();
        let stmt = statement();
        let index = store.index_create(&stmt, PERSON, NAME).unwrap();
        assert!(store.set_index_online(&index));
        assert_eq!(
            store.index_get_state(&stmt, &index).unwrap(),
            InternalIndexState::Online
        );
    }

    #[test]
    fn test_rule_ids_are_unique_and_increasing() {
        let store = SchemaStore::new();
        let stmt = statement();
        let a = store.index_create(&stmt, PERSON, NAME).unwrap();
        let b = store.index_create(&stmt, PERSON, AGE).unwrap();
        let id_a = store.index_get_committed_id(&stmt, &a).unwrap();
        let id_b = store.index_get_committed_id(&stmt, &b).unwrap();
        assert!(id_b > id_a);
    }

    #[test]
    fn test_missing_index_lookups() {
        let store = SchemaStore::new();
        let stmt = statement();
        let missing = IndexDescriptor::new(PERSON, NAME);
        assert_eq!(
            store.index_get_state(&stmt, &missing).unwrap_err(),
            SchemaReadError::IndexNotFound(missing)
        );
        assert!(matches!(
            store.index_get_committed_id(&stmt, &missing),
            Err(SchemaReadError::SchemaRuleNotFound(_))
        ));
        assert!(matches!(
            store.index_get_owning_uniqueness_constraint_id(&stmt, &missing),
            Err(SchemaReadError::SchemaRuleNotFound(_))
        ));
    }
}
