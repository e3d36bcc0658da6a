//! Lock vocabulary
//!
//! A [`LockRequest`] names a resource and a mode:
//!
//! | Resource kind | Identifier | Meaning |
//! |---------------|------------|---------|
//! | Node | node id | one node |
//! | Relationship | relationship id | one relationship |
//! | Schema | none | the whole schema (singleton) |
//! | Graph | none | the graph's global properties (singleton) |
//!
//! READ is shared between transactions, WRITE is exclusive.

use crate::types::{NodeId, RelationshipId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Class of a lockable resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    /// A single node
    Node,
    /// A single relationship
    Relationship,
    /// The whole schema
    Schema,
    /// The graph's global properties
    Graph,
}

impl ResourceKind {
    /// Whether resources of this kind are singletons (no identifier)
    pub fn is_singleton(&self) -> bool {
        matches!(self, ResourceKind::Schema | ResourceKind::Graph)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Node => "NODE",
            ResourceKind::Relationship => "RELATIONSHIP",
            ResourceKind::Schema => "SCHEMA",
            ResourceKind::Graph => "GRAPH",
        };
        f.write_str(name)
    }
}

/// Lock mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LockMode {
    /// Shared: any number of holders
    Read,
    /// Exclusive: a single holder
    Write,
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockMode::Read => f.write_str("READ"),
            LockMode::Write => f.write_str("WRITE"),
        }
    }
}

/// A lockable resource: kind plus optional identifier
///
/// Node and relationship resources always carry an identifier; schema and
/// graph resources never do. The constructors enforce this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LockResource {
    kind: ResourceKind,
    id: Option<u64>,
}

impl LockResource {
    /// The lock resource of one node
    pub fn node(id: NodeId) -> Self {
        Self {
            kind: ResourceKind::Node,
            id: Some(id.as_u64()),
        }
    }

    /// The lock resource of one relationship
    pub fn relationship(id: RelationshipId) -> Self {
        Self {
            kind: ResourceKind::Relationship,
            id: Some(id.as_u64()),
        }
    }

    /// The schema singleton
    pub fn schema() -> Self {
        Self {
            kind: ResourceKind::Schema,
            id: None,
        }
    }

    /// The graph-properties singleton
    pub fn graph() -> Self {
        Self {
            kind: ResourceKind::Graph,
            id: None,
        }
    }

    /// Resource kind
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Resource identifier (absent for singletons)
    pub fn id(&self) -> Option<u64> {
        self.id
    }
}

impl fmt::Display for LockResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{}({})", self.kind, id),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// A request for one lock on one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockRequest {
    /// Resource to lock
    pub resource: LockResource,
    /// Requested mode
    pub mode: LockMode,
}

impl LockRequest {
    /// Create a request
    pub fn new(resource: LockResource, mode: LockMode) -> Self {
        Self { resource, mode }
    }

    /// NODE WRITE(id)
    pub fn node_write(id: NodeId) -> Self {
        Self::new(LockResource::node(id), LockMode::Write)
    }

    /// RELATIONSHIP WRITE(id)
    pub fn relationship_write(id: RelationshipId) -> Self {
        Self::new(LockResource::relationship(id), LockMode::Write)
    }

    /// SCHEMA READ
    pub fn schema_read() -> Self {
        Self::new(LockResource::schema(), LockMode::Read)
    }

    /// SCHEMA WRITE
    pub fn schema_write() -> Self {
        Self::new(LockResource::schema(), LockMode::Write)
    }

    /// GRAPH WRITE
    pub fn graph_write() -> Self {
        Self::new(LockResource::graph(), LockMode::Write)
    }

    /// Resource kind of the request
    pub fn kind(&self) -> ResourceKind {
        self.resource.kind()
    }
}

impl fmt::Display for LockRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.resource, self.mode)
    }
}
