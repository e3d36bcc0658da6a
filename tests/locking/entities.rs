//! Entity Lock Scenarios
//!
//! - Mutations of the same node serialize on its WRITE lock
//! - A failed operation still holds the lock it took
//! - Different entities do not block each other
//! - Graph properties serialize on the GRAPH lock

use crate::*;
use graphkern::{EntityError, Error};
use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_same_node_label_serializes() {
    let db = Arc::new(create_db());
    let node = NodeId::new(42);
    assert!(db.graph().create_node_with_id(node));

    let a = db.begin();
    assert!(a.node_add_label(node, X).unwrap());

    let (id_tx, id_rx) = mpsc::channel();
    let other = {
        let db = Arc::clone(&db);
        thread::spawn(move || {
            let b = db.begin();
            id_tx.send(b.id()).unwrap();
            let added = b.node_add_label(node, X).unwrap();
            b.commit();
            added
        })
    };

    let b_id = id_rx.recv().unwrap();
    wait_until_waiting(&db, b_id);
    settle();
    assert!(!other.is_finished());
    assert_eq!(
        db.lock_manager().waiting_for(b_id),
        Some(LockRequest::node_write(node))
    );

    a.commit();

    // B ran after A: the label was already there
    assert!(!other.join().unwrap());
    assert_eq!(db.graph().node_labels(node), Some(vec![X]));
}

#[test]
fn test_failed_operation_still_holds_lock() {
    let db = Arc::new(create_db());
    let missing = NodeId::new(7);

    let a = db.begin();
    let err = a.node_remove_label(missing, X).unwrap_err();
    assert_eq!(err, Error::Entity(EntityError::node_not_found(missing)));
    assert!(a.holds(LockRequest::node_write(missing)));

    let (id_tx, id_rx) = mpsc::channel();
    let other = {
        let db = Arc::clone(&db);
        thread::spawn(move || {
            let b = db.begin();
            id_tx.send(b.id()).unwrap();
            let result = b.node_set_property(missing, NAME, "Ada");
            b.commit();
            result
        })
    };

    let b_id = id_rx.recv().unwrap();
    wait_until_waiting(&db, b_id);
    settle();
    assert!(!other.is_finished());

    a.rollback();

    let err = other.join().unwrap().unwrap_err();
    assert!(err.is_not_found());
    assert!(!err.is_lock_failure());
}

#[test]
fn test_relationship_delete_serializes_with_property_write() {
    let db = Arc::new(create_db());
    let setup = db.begin();
    let start = setup.create_node();
    let end = setup.create_node();
    let rel = setup.create_relationship(start, end).unwrap();
    setup.commit();

    let a = db.begin();
    a.relationship_set_property(rel, NAME, 1i64).unwrap();

    let (id_tx, id_rx) = mpsc::channel();
    let other = {
        let db = Arc::clone(&db);
        thread::spawn(move || {
            let b = db.begin();
            id_tx.send(b.id()).unwrap();
            let result = b.relationship_delete(rel);
            b.commit();
            result
        })
    };

    let b_id = id_rx.recv().unwrap();
    wait_until_waiting(&db, b_id);
    assert_eq!(
        db.lock_manager().waiting_for(b_id),
        Some(LockRequest::relationship_write(rel))
    );
    assert_eq!(db.graph().relationship_property(rel, NAME), Some(Value::Int(1)));

    a.commit();
    other.join().unwrap().unwrap();
    assert!(!db.graph().relationship_exists(rel));
}

#[test]
fn test_distinct_nodes_do_not_block() {
    const WRITERS: usize = 8;

    let db = Arc::new(create_db());
    let nodes: Vec<NodeId> = (0..WRITERS).map(|_| db.graph().create_node()).collect();
    let barrier = Arc::new(Barrier::new(WRITERS));

    let handles: Vec<_> = nodes
        .iter()
        .copied()
        .map(|node| {
            let db = Arc::clone(&db);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let tx = db.begin();
                tx.node_set_property(node, NAME, node.as_u64() as i64).unwrap();

                // All writers hold their node lock at once
                barrier.wait();
                assert_eq!(tx.lock_count(), 1);
                tx.commit();
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    for node in nodes {
        assert_eq!(
            db.graph().node_property(node, NAME),
            Some(Value::Int(node.as_u64() as i64))
        );
    }
    assert_eq!(db.lock_manager().locked_resources(), 0);
}

#[test]
fn test_graph_properties_serialize() {
    let db = Arc::new(create_db());
    let key = PropertyKeyId(9);

    let a = db.begin();
    assert_eq!(a.graph_set_property(key, "a").unwrap(), Property::NoProperty(key));

    let (id_tx, id_rx) = mpsc::channel();
    let other = {
        let db = Arc::clone(&db);
        thread::spawn(move || {
            let b = db.begin();
            id_tx.send(b.id()).unwrap();
            let previous = b.graph_set_property(key, "b").unwrap();
            b.commit();
            previous
        })
    };

    let b_id = id_rx.recv().unwrap();
    wait_until_waiting(&db, b_id);

    // Node writes are not covered by the GRAPH lock
    let node = a.create_node();
    let c = db.begin();
    c.node_add_label(node, PERSON).unwrap();
    c.commit();

    a.commit();
    let previous = other.join().unwrap();
    assert_eq!(previous.value(), Some(&Value::from("a")));
    assert_eq!(db.graph().graph_property(key), Some(Value::from("b")));
}
