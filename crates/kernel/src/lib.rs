//! Statement operations for graphkern
//!
//! This crate implements the kernel's operation surface:
//! - Capability traits: entity writes, schema reads, schema writes, schema state
//! - [`KernelStatement`]: the per-transaction context every operation receives
//! - [`LockingOperations`]: takes the required transaction lock, then delegates
//! - In-memory implementations of the capability traits ([`store`])

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod locking;
pub mod operations;
pub mod statement;
pub mod store;

pub use locking::{KernelOperation, LockingOperations};
pub use operations::{
    EntityWriteOperations, SchemaReadOperations, SchemaStateExt, SchemaStateOperations,
    SchemaWriteOperations,
};
pub use statement::KernelStatement;
pub use store::{GraphStore, SchemaStateCache, SchemaStore};
