//! Lock client trait
//!
//! The kernel never talks to the lock manager directly. Every statement
//! carries a [`Locks`] handle owned by its transaction, and lock requests go
//! through it. Acquisition blocks until the lock is granted or fails.

use graphkern_core::{LockError, LockRequest, NodeId, RelationshipId, TxnId};

/// Transaction-scoped lock client
///
/// Implementations block in [`Locks::acquire`] until the request is granted,
/// refused (deadlock) or timed out. A granted lock is held until the owning
/// transaction ends; there is no per-lock release.
pub trait Locks: Send + Sync {
    /// Transaction on whose behalf locks are taken
    fn txn_id(&self) -> TxnId;

    /// Acquire a lock, blocking until granted
    fn acquire(&self, request: LockRequest) -> Result<(), LockError>;

    /// NODE WRITE(id)
    fn acquire_node_write_lock(&self, id: NodeId) -> Result<(), LockError> {
        self.acquire(LockRequest::node_write(id))
    }

    /// RELATIONSHIP WRITE(id)
    fn acquire_relationship_write_lock(&self, id: RelationshipId) -> Result<(), LockError> {
        self.acquire(LockRequest::relationship_write(id))
    }

    /// SCHEMA READ
    fn acquire_schema_read_lock(&self) -> Result<(), LockError> {
        self.acquire(LockRequest::schema_read())
    }

    /// SCHEMA WRITE
    fn acquire_schema_write_lock(&self) -> Result<(), LockError> {
        self.acquire(LockRequest::schema_write())
    }

    /// GRAPH WRITE
    fn acquire_graph_write_lock(&self) -> Result<(), LockError> {
        self.acquire(LockRequest::graph_write())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Capture {
        seen: Mutex<Vec<LockRequest>>,
    }

    impl Locks for Capture {
        fn txn_id(&self) -> TxnId {
            TxnId(1)
        }

        fn acquire(&self, request: LockRequest) -> Result<(), LockError> {
            self.seen.lock().push(request);
            Ok(())
        }
    }

    #[test]
    fn test_helpers_build_expected_requests() {
        let c = Capture {
            seen: Mutex::new(Vec::new()),
        };
        c.acquire_node_write_lock(NodeId::new(1)).unwrap();
        c.acquire_relationship_write_lock(RelationshipId::new(2)).unwrap();
        c.acquire_schema_read_lock().unwrap();
        c.acquire_schema_write_lock().unwrap();
        c.acquire_graph_write_lock().unwrap();

        assert_eq!(
            *c.seen.lock(),
            vec![
                LockRequest::node_write(NodeId::new(1)),
                LockRequest::relationship_write(RelationshipId::new(2)),
                LockRequest::schema_read(),
                LockRequest::schema_write(),
                LockRequest::graph_write(),
            ]
        );
    }
}
