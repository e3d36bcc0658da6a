//! Schema Lock Scenarios
//!
//! - Schema writes exclude schema reads until the writer ends
//! - Schema reads do not exclude each other
//! - Schema writes wait for readers
//! - Failure lookups bypass the schema lock

use crate::*;
use parking_lot::Mutex;
use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_schema_write_blocks_reader_until_commit() {
    let db = Arc::new(create_db());

    let a = db.begin();
    let index = a.index_create(PERSON, NAME).unwrap();

    let (id_tx, id_rx) = mpsc::channel();
    let reader = {
        let db = Arc::clone(&db);
        thread::spawn(move || {
            let b = db.begin();
            id_tx.send(b.id()).unwrap();
            let all = b.indexes_get_all().unwrap();
            b.commit();
            all
        })
    };

    let b_id = id_rx.recv().unwrap();
    wait_until_waiting(&db, b_id);
    settle();
    assert!(!reader.is_finished());
    assert_eq!(
        db.lock_manager().waiting_for(b_id),
        Some(LockRequest::schema_read())
    );

    a.commit();
    assert_eq!(reader.join().unwrap(), vec![index]);
}

#[test]
fn test_schema_readers_share() {
    const READERS: usize = 4;

    let db = Arc::new(create_db());
    let setup = db.begin();
    let index = setup.index_create(PERSON, NAME).unwrap();
    setup.commit();

    let barrier = Arc::new(Barrier::new(READERS));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..READERS)
        .map(|_| {
            let db = Arc::clone(&db);
            let barrier = Arc::clone(&barrier);
            let seen = Arc::clone(&seen);
            thread::spawn(move || {
                let tx = db.begin();
                let state = tx.index_get_state(&index).unwrap();
                assert!(tx.holds(LockRequest::schema_read()));

                // Every reader holds SCHEMA READ at this point
                barrier.wait();
                seen.lock().push(state);
                tx.commit();
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let seen = seen.lock();
    assert_eq!(seen.len(), READERS);
    assert!(seen.iter().all(|s| *s == InternalIndexState::Populating));
}

#[test]
fn test_schema_write_waits_for_reader() {
    let db = Arc::new(create_db());

    let a = db.begin();
    assert!(a.constraints_get_all().unwrap().is_empty());

    let (id_tx, id_rx) = mpsc::channel();
    let writer = {
        let db = Arc::clone(&db);
        thread::spawn(move || {
            let b = db.begin();
            id_tx.send(b.id()).unwrap();
            let constraint = b.uniqueness_constraint_create(PERSON, NAME).unwrap();
            b.commit();
            constraint
        })
    };

    let b_id = id_rx.recv().unwrap();
    wait_until_waiting(&db, b_id);
    settle();
    assert!(!writer.is_finished());

    // A's view is stable while it holds SCHEMA READ
    assert!(a.constraints_get_all().unwrap().is_empty());
    a.commit();

    let constraint = writer.join().unwrap();
    let c = db.begin();
    assert_eq!(c.constraints_get_for_label(PERSON).unwrap(), vec![constraint]);
    assert_eq!(c.unique_indexes_get_all().unwrap(), vec![constraint.index()]);
}

#[test]
fn test_index_failure_readable_during_schema_write() {
    let db = create_db();
    let setup = db.begin();
    let index = setup.index_create(PERSON, NAME).unwrap();
    setup.commit();
    db.schema().set_index_failed(&index, "out of disk");

    let writer = db.begin();
    writer.index_create(PERSON, PropertyKeyId(2)).unwrap();

    // Same thread: this would block forever if it needed SCHEMA READ
    let reader = db.begin();
    assert_eq!(
        reader.index_get_failure(&index).unwrap(),
        Some("out of disk".to_string())
    );
    assert_eq!(reader.lock_count(), 0);

    writer.commit();
    reader.commit();
}

#[test]
fn test_schema_state_waits_for_schema_write() {
    let db = Arc::new(create_db());
    let key = SchemaStateKey::from("plan:person");

    let a = db.begin();
    a.index_create(PERSON, NAME).unwrap();

    let (id_tx, id_rx) = mpsc::channel();
    let reader = {
        let db = Arc::clone(&db);
        let key = key.clone();
        thread::spawn(move || {
            let b = db.begin();
            id_tx.send(b.id()).unwrap();
            let contains = b.schema_state_contains(&key).unwrap();
            b.commit();
            contains
        })
    };

    let b_id = id_rx.recv().unwrap();
    wait_until_waiting(&db, b_id);

    let plan = a
        .schema_state_get_or_create_typed(&key, |_| "index seek".to_string())
        .unwrap();
    assert_eq!(plan.as_deref().map(String::as_str), Some("index seek"));
    a.commit();

    assert!(reader.join().unwrap());
}
