use rusqlite::Connection;
use storedesk_core::db::{open_db, BackendKind};
use storedesk_core::{
    Address, AddressPatch, DocumentStore, NationalId, NewAddress, NewProduct, Price, Product,
    RecordRepository, RepoError, SequenceAllocator, User,
};

fn file_store() -> (tempfile::TempDir, std::path::PathBuf, DocumentStore) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("documents.db");
    let store = DocumentStore::open(&path).unwrap();
    (dir, path, store)
}

fn rice() -> NewProduct {
    NewProduct::new("Rice", Price::from_cents(1250), 10)
}

#[test]
fn product_key_is_the_allocated_sequence_value() {
    let (_dir, path, mut store) = file_store();

    let first = RecordRepository::<Product>::create(&mut store, &rice()).unwrap();
    assert_eq!(store.allocator().current("products").unwrap(), first);

    let second = RecordRepository::<Product>::create(&mut store, &rice()).unwrap();
    assert_eq!(second, first + 1);

    // Another connection sharing the file continues the same sequence.
    let conn = open_db(&path, BackendKind::Document).unwrap();
    assert_eq!(
        SequenceAllocator::new(&conn).next_id("products").unwrap(),
        second + 1
    );
}

#[test]
fn synthetic_keys_are_stored_as_integers_and_natural_keys_as_text() {
    let (_dir, path, mut store) = file_store();
    RecordRepository::<Product>::create(&mut store, &rice()).unwrap();
    let user = User::new(NationalId::new("111").unwrap(), "Ana", "a@x.com");
    RecordRepository::<User>::create(&mut store, &user).unwrap();

    let conn = Connection::open(&path).unwrap();
    let key_type = |collection: &str| -> String {
        conn.query_row(
            "SELECT typeof(doc_id) FROM documents WHERE collection = ?1;",
            [collection],
            |row| row.get(0),
        )
        .unwrap()
    };
    assert_eq!(key_type("products"), "integer");
    assert_eq!(key_type("users"), "text");
}

#[test]
fn documents_hold_json_bodies() {
    let (_dir, path, mut store) = file_store();
    let id = RecordRepository::<Product>::create(&mut store, &rice()).unwrap();

    let conn = Connection::open(&path).unwrap();
    let body: String = conn
        .query_row(
            "SELECT body FROM documents WHERE collection = 'products' AND doc_id = ?1;",
            [id],
            |row| row.get(0),
        )
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["name"], "Rice");
    assert_eq!(value["price"], "12.50");
    assert_eq!(value["quantity"], 10);
}

#[test]
fn failed_allocation_writes_no_document() {
    let (_dir, path, mut store) = file_store();
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("DROP TABLE counters;").unwrap();

    let err = RecordRepository::<Product>::create(&mut store, &rice()).unwrap_err();
    assert!(matches!(err, RepoError::BackendUnavailable(_)), "{err}");
    assert!(RecordRepository::<Product>::list(&store).unwrap().is_empty());
}

#[test]
fn malformed_document_is_reported_as_invalid_data() {
    let (_dir, path, store) = file_store();
    let conn = Connection::open(&path).unwrap();
    conn.execute(
        "INSERT INTO documents (collection, doc_id, body) VALUES ('addresses', 1, '{\"street\": 5}');",
        [],
    )
    .unwrap();

    let err = RecordRepository::<Address>::list(&store).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)), "{err}");
}

#[test]
fn address_update_rejects_complement_before_touching_the_store() {
    let (_dir, _path, mut store) = file_store();
    let draft = NewAddress {
        street: "Rua A".to_string(),
        number: 1,
        neighborhood: "Centro".to_string(),
        city: "Recife".to_string(),
        postal_code: "50000000".to_string(),
        complement: String::new(),
    };
    let id = RecordRepository::<Address>::create(&mut store, &draft).unwrap();

    let patch = AddressPatch {
        street: "Rua B".to_string(),
        number: 2,
        complement: Some("fundos".to_string()),
    };
    let err = RecordRepository::<Address>::update(&mut store, &id, &patch).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(
        RecordRepository::<Address>::list(&store).unwrap(),
        vec![draft.into_address(id)]
    );
}

#[test]
fn list_preserves_insertion_order() {
    let (_dir, _path, mut store) = file_store();
    for name in ["Rice", "Beans", "Coffee"] {
        let draft = NewProduct::new(name, Price::from_cents(100), 1);
        RecordRepository::<Product>::create(&mut store, &draft).unwrap();
    }

    let names: Vec<String> = RecordRepository::<Product>::list(&store)
        .unwrap()
        .into_iter()
        .map(|product| product.name)
        .collect();
    assert_eq!(names, ["Rice", "Beans", "Coffee"]);
}
