//! In-memory capability implementations
//!
//! - [`GraphStore`]: entity writes
//! - [`SchemaStore`]: schema reads and writes
//! - [`SchemaStateCache`]: schema-derived cache
//!
//! None of these take locks. They are meant to sit behind
//! [`crate::LockingOperations`].

pub mod graph;
pub mod schema;
pub mod schema_state;

pub use graph::GraphStore;
pub use schema::SchemaStore;
pub use schema_state::SchemaStateCache;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::statement::KernelStatement;
    use graphkern_concurrency::Locks;
    use graphkern_core::{LockError, LockRequest, TxnId};
    use std::sync::Arc;

    /// Lock client that grants everything
    struct NoLocks;

    impl Locks for NoLocks {
        fn txn_id(&self) -> TxnId {
            TxnId(0)
        }

        fn acquire(&self, _request: LockRequest) -> Result<(), LockError> {
            Ok(())
        }
    }

    pub(crate) fn statement() -> KernelStatement {
        KernelStatement::new(Arc::new(NoLocks))
    }
}
