//! Schema descriptors
//!
//! Indexes and uniqueness constraints are both keyed by a (label, property
//! key) pair. A uniqueness constraint is backed by a unique index that the
//! constraint owns.

use crate::types::{LabelId, PropertyKeyId};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Describes an index over one property of nodes carrying one label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Indexed label
    pub label: LabelId,
    /// Indexed property key
    pub property_key: PropertyKeyId,
}

impl IndexDescriptor {
    /// Create a descriptor
    pub fn new(label: LabelId, property_key: PropertyKeyId) -> Self {
        Self {
            label,
            property_key,
        }
    }
}

impl fmt::Display for IndexDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "index on :{}({})", self.label.0, self.property_key.0)
    }
}

/// Population state of an index
///
/// ```text
/// Populating ──► Online
///     │
///     └────────► Failed (failure description recorded)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InternalIndexState {
    /// Index is being built from existing data
    Populating,
    /// Index is usable
    Online,
    /// Population failed; a failure description is available
    Failed,
}

/// A uniqueness constraint on (label, property key)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UniquenessConstraint {
    /// Constrained label
    pub label: LabelId,
    /// Constrained property key
    pub property_key: PropertyKeyId,
}

impl UniquenessConstraint {
    /// Create a constraint descriptor
    pub fn new(label: LabelId, property_key: PropertyKeyId) -> Self {
        Self {
            label,
            property_key,
        }
    }

    /// Descriptor of the unique index backing this constraint
    pub fn index(&self) -> IndexDescriptor {
        IndexDescriptor::new(self.label, self.property_key)
    }

    /// Check whether this constraint targets the given label and key
    pub fn matches(&self, label: LabelId, property_key: PropertyKeyId) -> bool {
        self.label == label && self.property_key == property_key
    }
}

impl fmt::Display for UniquenessConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "uniqueness constraint on :{}({})",
            self.label.0, self.property_key.0
        )
    }
}

/// Opaque key into the schema-state cache
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaStateKey(String);

impl SchemaStateKey {
    /// Create a cache key
    pub fn new(key: impl Into<String>) -> Self {
        SchemaStateKey(key.into())
    }

    /// Key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SchemaStateKey {
    fn from(key: &str) -> Self {
        SchemaStateKey::new(key)
    }
}

impl fmt::Display for SchemaStateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value stored in the schema-state cache
///
/// Values are derived from the current schema (compiled plans, index
/// lookups) and are shared between readers.
pub type SchemaStateValue = Arc<dyn Any + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_owns_matching_index() {
        let c = UniquenessConstraint::new(LabelId(1), PropertyKeyId(2));
        assert_eq!(c.index(), IndexDescriptor::new(LabelId(1), PropertyKeyId(2)));
        assert!(c.matches(LabelId(1), PropertyKeyId(2)));
        assert!(!c.matches(LabelId(1), PropertyKeyId(3)));
    }

    #[test]
    fn test_descriptor_display() {
        let d = IndexDescriptor::new(LabelId(4), PropertyKeyId(5));
        assert_eq!(d.to_string(), "index on :4(5)");
    }
}
