//! # graphkern
//!
//! Transactional property-graph kernel with lock-before-access statement
//! operations.
//!
//! Every kernel operation (entity writes, schema reads and writes, the
//! schema-state cache) first acquires the transaction lock that guards the
//! data it touches, then delegates to the store. Locks are held until the
//! transaction ends.
//!
//! ## Quick Start
//!
//! ```ignore
//! use graphkern::prelude::*;
//!
//! let db = GraphDatabase::in_memory();
//!
//! let tx = db.begin();
//! let index = tx.index_create(LabelId(1), PropertyKeyId(1))?;
//! let node = tx.create_node();
//! tx.node_add_label(node, LabelId(1))?;
//! tx.node_set_property(node, PropertyKeyId(1), "Ada")?;
//! tx.commit();
//! ```
//!
//! ## Locks
//!
//! | Operations | Lock |
//! |------------|------|
//! | `node_*` | NODE WRITE (node id) |
//! | `relationship_*` | RELATIONSHIP WRITE (relationship id) |
//! | `graph_*` | GRAPH WRITE |
//! | index / constraint create and drop | SCHEMA WRITE |
//! | schema lookups, schema-state cache | SCHEMA READ |
//! | `index_get_failure` | none |
//!
//! ## Crates
//!
//! - [`graphkern_core`]: ids, values, schema descriptors, lock requests, errors
//! - [`graphkern_concurrency`]: lock client trait and the blocking lock manager
//! - [`graphkern_kernel`]: operation traits, the locking layer, in-memory stores

#![warn(missing_docs)]

mod database;
mod error;
mod transaction;

pub mod prelude;

// Re-export main entry points
pub use database::{GraphDatabase, GraphDatabaseBuilder};
pub use error::{Error, Result};
pub use transaction::Transaction;

// Re-export core types
pub use graphkern_core::{
    EntityError, EntityKind, LockError, SchemaReadError, SchemaWriteError,
};
pub use graphkern_core::{
    DefinedProperty, IndexDescriptor, InternalIndexState, LabelId, LockMode, LockRequest,
    LockResource, NodeId, Property, PropertyKeyId, RelationshipId, ResourceKind, SchemaStateKey,
    SchemaStateValue, TxnId, UniquenessConstraint, Value,
};
