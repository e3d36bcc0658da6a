//! Core identifier types for the graph kernel
//!
//! This module defines the identifiers used throughout the system:
//! - [`NodeId`] / [`RelationshipId`]: entity identifiers, used as lock scopes
//! - [`LabelId`] / [`PropertyKeyId`]: token identifiers for schema rules
//! - [`TxnId`]: identifies a transaction to the lock manager

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a node in the graph
///
/// Node ids double as the identifier of the per-node lock resource.
///
/// # Examples
///
/// ```
/// use graphkern_core::types::NodeId;
///
/// let id = NodeId::new(42);
/// assert_eq!(id.as_u64(), 42);
/// assert_eq!(id.to_string(), "node:42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Create a node id from its raw value
    pub const fn new(id: u64) -> Self {
        NodeId(id)
    }

    /// Raw value of this id
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        NodeId(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

/// Identifier of a relationship in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationshipId(u64);

impl RelationshipId {
    /// Create a relationship id from its raw value
    pub const fn new(id: u64) -> Self {
        RelationshipId(id)
    }

    /// Raw value of this id
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for RelationshipId {
    fn from(id: u64) -> Self {
        RelationshipId(id)
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "relationship:{}", self.0)
    }
}

/// Label token id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LabelId(pub u32);

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "label:{}", self.0)
    }
}

/// Property key token id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyKeyId(pub u32);

impl fmt::Display for PropertyKeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "property_key:{}", self.0)
    }
}

/// Transaction identifier
///
/// Allocated monotonically by the database facade. The lock manager keys
/// ownership and wait-for edges by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxnId(pub u64);

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}
