//! Per-transaction lock client
//!
//! [`TransactionLocks`] binds a [`LockManager`] to one transaction. It is the
//! [`Locks`] implementation handed to the kernel through the statement
//! context. Every lock it acquires stays held until [`TransactionLocks::release_all`]
//! is called at transaction end (or the handle is dropped).

use crate::client::Locks;
use crate::manager::LockManager;
use graphkern_core::{LockError, LockRequest, TxnId};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Lock client owned by one transaction
#[derive(Debug)]
pub struct TransactionLocks {
    txn: TxnId,
    manager: Arc<LockManager>,
    closed: AtomicBool,
    requests: AtomicU64,
}

impl TransactionLocks {
    /// Create the lock client for `txn`
    pub fn new(txn: TxnId, manager: Arc<LockManager>) -> Self {
        TransactionLocks {
            txn,
            manager,
            closed: AtomicBool::new(false),
            requests: AtomicU64::new(0),
        }
    }

    /// Release every lock of this transaction
    ///
    /// After this call the client refuses new requests with
    /// [`LockError::Terminated`]. Calling it twice is a no-op.
    pub fn release_all(&self) -> usize {
        if self.closed.swap(true, Ordering::SeqCst) {
            return 0;
        }
        self.manager.release_all(self.txn)
    }

    /// Whether the transaction has ended
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of lock requests issued through this client
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Check whether this transaction holds `request`
    pub fn holds(&self, request: LockRequest) -> bool {
        self.manager.holds(self.txn, request)
    }

    /// The manager this client issues requests to
    pub fn manager(&self) -> &Arc<LockManager> {
        &self.manager
    }
}

impl Locks for TransactionLocks {
    fn txn_id(&self) -> TxnId {
        self.txn
    }

    fn acquire(&self, request: LockRequest) -> Result<(), LockError> {
        let terminated = LockError::Terminated {
            txn: self.txn,
            request,
        };
        if self.is_closed() {
            return Err(terminated);
        }
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.manager.acquire(self.txn, request)?;

        // A concurrent release_all may have run before this grant; it will
        // not run again, so the grant must be undone here.
        if self.is_closed() {
            self.manager.release_all(self.txn);
            return Err(terminated);
        }
        Ok(())
    }
}

impl Drop for TransactionLocks {
    fn drop(&mut self) {
        self.release_all();
    }
}
