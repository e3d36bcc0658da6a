//! Core types for graphkern
//!
//! This crate defines the vocabulary shared by every other crate:
//! - Identifiers: [`NodeId`], [`RelationshipId`], [`LabelId`], [`PropertyKeyId`], [`TxnId`]
//! - Property values: [`Value`], [`DefinedProperty`], [`Property`]
//! - Schema descriptors: [`IndexDescriptor`], [`UniquenessConstraint`], [`InternalIndexState`]
//! - Lock vocabulary: [`ResourceKind`], [`LockMode`], [`LockResource`], [`LockRequest`]
//! - Error taxonomy: [`LockError`], [`EntityError`], [`SchemaReadError`], [`SchemaWriteError`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod lock;
pub mod schema;
pub mod types;
pub mod value;

pub use error::{EntityError, EntityKind, LockError, SchemaReadError, SchemaWriteError};
pub use lock::{LockMode, LockRequest, LockResource, ResourceKind};
pub use schema::{
    IndexDescriptor, InternalIndexState, SchemaStateKey, SchemaStateValue, UniquenessConstraint,
};
pub use types::{LabelId, NodeId, PropertyKeyId, RelationshipId, TxnId};
pub use value::{DefinedProperty, Property, Value};
