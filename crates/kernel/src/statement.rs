//! Statement context
//!
//! A [`KernelStatement`] is created by the owning transaction and passed as
//! the first argument of every kernel operation. It carries the
//! transaction's lock client; nothing in the kernel reaches a lock manager
//! any other way.

use graphkern_concurrency::Locks;
use graphkern_core::TxnId;
use std::fmt;
use std::sync::Arc;

/// Per-transaction statement context
#[derive(Clone)]
pub struct KernelStatement {
    locks: Arc<dyn Locks>,
}

impl KernelStatement {
    /// Create a statement issuing lock requests through `locks`
    pub fn new(locks: Arc<dyn Locks>) -> Self {
        KernelStatement { locks }
    }

    /// The transaction's lock client
    pub fn locks(&self) -> &dyn Locks {
        self.locks.as_ref()
    }

    /// Transaction this statement belongs to
    pub fn txn_id(&self) -> TxnId {
        self.locks.txn_id()
    }
}

impl fmt::Debug for KernelStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelStatement")
            .field("txn", &self.txn_id())
            .finish()
    }
}
