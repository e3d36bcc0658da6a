//! Locking Scenario Test Suite
//!
//! Multi-transaction scenarios run against the in-memory database with the
//! blocking lock manager. Each scenario parks one transaction on a lock held
//! by another and checks what it observes once the holder ends.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test locking
//!
//! # Schema scenarios only
//! cargo test --test locking schema::
//! ```

use graphkern::prelude::*;
use std::thread;
use std::time::{Duration, Instant};

// Test modules
pub mod deadlock;
pub mod entities;
pub mod schema;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

pub const PERSON: LabelId = LabelId(1);
pub const NAME: PropertyKeyId = PropertyKeyId(1);
pub const X: LabelId = LabelId(7);

/// Install a test subscriber so lock manager logs show up with `--nocapture`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Create an in-memory test database
pub fn create_db() -> GraphDatabase {
    init_tracing();
    GraphDatabase::in_memory()
}

/// Block until `txn` is parked in the lock manager
pub fn wait_until_waiting(db: &GraphDatabase, txn: TxnId) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !db.lock_manager().is_waiting(txn) {
        assert!(
            Instant::now() < deadline,
            "transaction {:?} never blocked on a lock",
            txn
        );
        thread::sleep(Duration::from_millis(1));
    }
}

/// Give a parked transaction a chance to (wrongly) proceed
pub fn settle() {
    thread::sleep(Duration::from_millis(20));
}
