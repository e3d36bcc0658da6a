//! Deadlock and Timeout Scenarios
//!
//! - Crossing node locks: the transaction closing the cycle is refused
//! - Two readers upgrading the schema lock deadlock
//! - A bounded wait fails with a timeout and leaves the holder untouched

use crate::*;
use graphkern::LockError;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_crossing_node_locks_refuse_cycle_closer() {
    let db = Arc::new(create_db());
    let first = db.graph().create_node();
    let second = db.graph().create_node();

    let a = db.begin();
    a.node_add_label(first, X).unwrap();

    let (id_tx, id_rx) = mpsc::channel();
    let other = {
        let db = Arc::clone(&db);
        thread::spawn(move || {
            let b = db.begin();
            id_tx.send(b.id()).unwrap();
            b.node_add_label(second, X).unwrap();
            // Parks on A's lock
            let result = b.node_add_label(first, PERSON);
            b.commit();
            result
        })
    };

    let b_id = id_rx.recv().unwrap();
    wait_until_waiting(&db, b_id);

    // A -> B -> A: A is the requester that closes the cycle
    let err = a.node_add_label(second, PERSON).unwrap_err();
    assert!(err.is_deadlock());
    assert!(matches!(
        err.lock_error(),
        Some(LockError::Deadlock { request, .. }) if *request == LockRequest::node_write(second)
    ));
    assert!(!a.holds(LockRequest::node_write(second)));
    assert!(a.holds(LockRequest::node_write(first)));

    a.rollback();
    assert!(other.join().unwrap().unwrap());
    assert_eq!(db.graph().node_labels(second), Some(vec![X]));
}

#[test]
fn test_schema_upgrade_deadlock() {
    let db = Arc::new(create_db());

    let a = db.begin();
    a.indexes_get_all().unwrap();

    let (id_tx, id_rx) = mpsc::channel();
    let other = {
        let db = Arc::clone(&db);
        thread::spawn(move || {
            let b = db.begin();
            id_tx.send(b.id()).unwrap();
            b.indexes_get_all().unwrap();
            // Upgrade waits for A's READ
            let result = b.index_create(PERSON, NAME);
            b.commit();
            result
        })
    };

    let b_id = id_rx.recv().unwrap();
    wait_until_waiting(&db, b_id);

    let err = a.uniqueness_constraint_create(PERSON, NAME).unwrap_err();
    assert!(err.is_deadlock());
    a.rollback();

    let index = other.join().unwrap().unwrap();
    let c = db.begin();
    assert_eq!(c.indexes_get_all().unwrap(), vec![index]);
    assert!(c.constraints_get_all().unwrap().is_empty());
}

#[test]
fn test_lock_timeout() {
    init_tracing();
    let db = GraphDatabase::builder()
        .lock_timeout(Duration::from_millis(50))
        .build();
    let node = db.graph().create_node();

    let a = db.begin();
    a.node_delete(node).unwrap();

    // Same thread: the bounded wait returns instead of hanging
    let b = db.begin();
    let err = b.node_add_label(node, X).unwrap_err();
    assert!(err.is_lock_failure());
    assert!(!err.is_deadlock());
    match err.lock_error() {
        Some(LockError::Timeout { request, waited_ms }) => {
            assert_eq!(*request, LockRequest::node_write(node));
            assert!(*waited_ms >= 50);
        }
        other => panic!("expected timeout, got {:?}", other),
    }

    assert!(a.holds(LockRequest::node_write(node)));
    assert!(!db.lock_manager().is_waiting(b.id()));
    b.rollback();
    a.commit();
    assert!(!db.graph().node_exists(node));
}

#[test]
fn test_dropped_transaction_unblocks_waiter() {
    let db = Arc::new(create_db());

    let a = db.begin();
    a.graph_remove_property(PropertyKeyId(3)).unwrap();

    let (id_tx, id_rx) = mpsc::channel();
    let other = {
        let db = Arc::clone(&db);
        thread::spawn(move || {
            let b = db.begin();
            id_tx.send(b.id()).unwrap();
            b.graph_set_property(PropertyKeyId(3), true).unwrap()
        })
    };

    let b_id = id_rx.recv().unwrap();
    wait_until_waiting(&db, b_id);

    drop(a);
    assert_eq!(other.join().unwrap(), Property::NoProperty(PropertyKeyId(3)));
    assert_eq!(db.lock_manager().locked_resources(), 0);
}
