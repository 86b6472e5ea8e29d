use std::collections::HashSet;
use std::thread;

use storedesk_core::db::{open_db, open_db_in_memory, BackendKind};
use storedesk_core::{
    DocumentStore, NewProduct, Price, Product, RecordRepository, RepoError, SequenceAllocator,
};

#[test]
fn sequential_calls_return_consecutive_values() {
    let conn = open_db_in_memory(BackendKind::Document).unwrap();
    let allocator = SequenceAllocator::new(&conn);

    let ids: Vec<i64> = (0..5).map(|_| allocator.next_id("products").unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    assert_eq!(allocator.current("products").unwrap(), 5);
}

#[test]
fn sequences_are_independent_per_name() {
    let conn = open_db_in_memory(BackendKind::Document).unwrap();
    let allocator = SequenceAllocator::new(&conn);

    assert_eq!(allocator.current("addresses").unwrap(), 0);
    assert_eq!(allocator.next_id("products").unwrap(), 1);
    assert_eq!(allocator.next_id("products").unwrap(), 2);
    assert_eq!(allocator.next_id("addresses").unwrap(), 1);
}

#[test]
fn blank_sequence_name_is_rejected() {
    let conn = open_db_in_memory(BackendKind::Document).unwrap();
    let err = SequenceAllocator::new(&conn).next_id(" ").unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[test]
fn missing_counter_table_reports_backend_unavailable() {
    let conn = open_db_in_memory(BackendKind::Relational).unwrap();
    let err = SequenceAllocator::new(&conn).next_id("products").unwrap_err();
    assert!(matches!(err, RepoError::BackendUnavailable(_)));
}

#[test]
fn counter_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("documents.db");

    {
        let conn = open_db(&path, BackendKind::Document).unwrap();
        let allocator = SequenceAllocator::new(&conn);
        allocator.next_id("products").unwrap();
        allocator.next_id("products").unwrap();
    }

    let conn = open_db(&path, BackendKind::Document).unwrap();
    assert_eq!(SequenceAllocator::new(&conn).next_id("products").unwrap(), 3);
}

#[test]
fn deleted_ids_are_never_reused() {
    let mut store = DocumentStore::open_in_memory().unwrap();
    let draft = NewProduct::new("Rice", Price::from_cents(1250), 10);

    let first = RecordRepository::<Product>::create(&mut store, &draft).unwrap();
    RecordRepository::<Product>::delete(&mut store, &first).unwrap();
    let second = RecordRepository::<Product>::create(&mut store, &draft).unwrap();

    assert_eq!(second, first + 1);
}

#[test]
fn concurrent_connections_never_share_a_value() {
    const THREADS: usize = 4;
    const CALLS_PER_THREAD: usize = 25;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("documents.db");
    // Migrate once up front so workers only allocate.
    drop(open_db(&path, BackendKind::Document).unwrap());

    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let path = path.clone();
            thread::spawn(move || {
                let conn = open_db(&path, BackendKind::Document).unwrap();
                let allocator = SequenceAllocator::new(&conn);
                (0..CALLS_PER_THREAD)
                    .map(|_| allocator.next_id("products").unwrap())
                    .collect::<Vec<i64>>()
            })
        })
        .collect();

    let mut all = Vec::new();
    for worker in workers {
        let ids = worker.join().unwrap();
        // Each caller sees its own values strictly increasing.
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        all.extend(ids);
    }

    let total = THREADS * CALLS_PER_THREAD;
    let distinct: HashSet<i64> = all.iter().copied().collect();
    assert_eq!(distinct.len(), total);

    all.sort_unstable();
    let expected: Vec<i64> = (1..=total as i64).collect();
    assert_eq!(all, expected);
}
