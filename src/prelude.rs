//! Convenient imports for graphkern.
//!
//! ```ignore
//! use graphkern::prelude::*;
//!
//! let db = GraphDatabase::in_memory();
//! let tx = db.begin();
//! ```

// Main entry point
pub use crate::database::{GraphDatabase, GraphDatabaseBuilder};
pub use crate::transaction::Transaction;

// Error handling
pub use crate::error::{Error, Result};

// Ids and values
pub use graphkern_core::{LabelId, NodeId, Property, PropertyKeyId, RelationshipId, TxnId, Value};

// Schema
pub use graphkern_core::{IndexDescriptor, InternalIndexState, SchemaStateKey, UniquenessConstraint};

// Locks
pub use graphkern_core::{LockMode, LockRequest};
