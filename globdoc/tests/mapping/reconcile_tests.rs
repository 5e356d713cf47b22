use super::support::*;

#[test]
fn creates_only_the_missing_index() {
    init_logging();
    let ty = scored_type();
    let mut store = MemoryStore::new().with_index("t", StoreIndexDescriptor::new("idx_id", vec![IndexKey::asc("id")], false));

    let report = reconcile_type(&mut store, &ty).expect("reconcile");

    assert_eq!(report.created, vec!["idx_name".to_string()]);
    assert_eq!(report.present, vec!["idx_id".to_string()]);
    assert_eq!(trace(&store), vec!["list:t", "create:t:idx_name"]);
    let created = created_indexes(&store);
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].name, "idx_name");
    assert!(created[0].unique);
    assert_eq!(created[0].key, vec![IndexKey::asc("name")]);
}

#[test]
fn second_pass_is_idempotent() {
    let ty = scored_type();
    let mut store = MemoryStore::new();

    let first = reconcile_type(&mut store, &ty).expect("first pass");
    assert_eq!(first.created, vec!["idx_name".to_string(), "idx_id".to_string()]);
    let non_unique = &created_indexes(&store)[1];
    assert_eq!(non_unique.name, "idx_id");
    assert!(!non_unique.unique);

    store.clear_journal();
    let second = reconcile_type(&mut store, &ty).expect("second pass");
    assert!(second.created.is_empty());
    assert_eq!(second.present.len(), 2);
    assert_eq!(trace(&store), vec!["list:t"]);
}

#[test]
fn match_ignores_key_order_and_index_name() {
    let ty = EntityType::builder("Pair")
        .field(FieldDescriptor::string("a"))
        .field(FieldDescriptor::string("b"))
        .index("ab", ["a", "b"])
        .build()
        .unwrap();
    let mut store = MemoryStore::new().with_index(
        "Pair",
        StoreIndexDescriptor::new("legacy_ba", vec![IndexKey::asc("b"), IndexKey::asc("a")], false),
    );

    let report = reconcile_type(&mut store, &ty).unwrap();

    assert!(report.created.is_empty());
    assert_eq!(trace(&store), vec!["list:Pair"]);
}

#[test]
fn subset_or_superset_keys_do_not_match() {
    let ty = EntityType::builder("Pair")
        .field(FieldDescriptor::string("a"))
        .field(FieldDescriptor::string("b"))
        .index("ab", ["a", "b"])
        .build()
        .unwrap();
    let mut store = MemoryStore::new()
        .with_index("Pair", StoreIndexDescriptor::new("a_only", vec![IndexKey::asc("a")], false))
        .with_index(
            "Pair",
            StoreIndexDescriptor::new(
                "abc",
                vec![IndexKey::asc("a"), IndexKey::asc("b"), IndexKey::asc("c")],
                false,
            ),
        );

    let report = reconcile_type(&mut store, &ty).unwrap();
    assert_eq!(report.created, vec!["ab".to_string()]);
}

#[test]
fn empty_declaration_does_not_touch_the_store() {
    let ty = EntityType::builder("NoIndexes")
        .field(FieldDescriptor::string("a"))
        .build()
        .unwrap();
    let mut store = MemoryStore::new();
    store.fail_on(FailurePoint::ListIndexes);

    let report = reconcile_type(&mut store, &ty).expect("no store call expected");

    assert!(report.created.is_empty() && report.present.is_empty());
    assert!(store.journal().is_empty());
}

#[test]
fn key_document_uses_resolved_store_names() {
    let ty = EntityType::builder("Account")
        .field(FieldDescriptor::integer("id").key().identity())
        .field(FieldDescriptor::string("email").store_name("mail"))
        .field(FieldDescriptor::string("region"))
        .unique_index("by_id", ["id"])
        .index("by_region_mail", ["region", "email"])
        .build()
        .unwrap();
    let mut store = MemoryStore::new();

    reconcile_type(&mut store, &ty).unwrap();

    let created = created_indexes(&store);
    assert_eq!(created[0].key, vec![IndexKey::asc("_id")]);
    assert_eq!(created[1].key, vec![IndexKey::asc("region"), IndexKey::asc("mail")]);
}

#[test]
fn undeclared_live_indexes_are_left_alone() {
    let ty = scored_type();
    let mut store = MemoryStore::new()
        .with_index("t", StoreIndexDescriptor::new("old_score", vec![IndexKey::asc("score")], true));

    reconcile_type(&mut store, &ty).unwrap();

    let names: Vec<&str> = store.indexes("t").iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["old_score", "idx_name", "idx_id"]);
}

#[test]
fn list_failure_propagates_without_creating() {
    let ty = scored_type();
    let mut store = MemoryStore::new();
    store.fail_on(FailurePoint::ListIndexes);

    let err = reconcile_type(&mut store, &ty).unwrap_err();

    assert!(err.is_store_failure());
    assert_eq!(trace(&store), vec!["list:t"]);
}

#[test]
fn create_failure_stops_the_pass() {
    let ty = scored_type();
    let mut store = MemoryStore::new();
    store.fail_on(FailurePoint::CreateIndex);

    let err = reconcile_type(&mut store, &ty).unwrap_err();

    assert!(matches!(err, MappingError::Store { .. }));
    assert_eq!(trace(&store), vec!["list:t", "create:t:idx_name"]);
    assert!(store.indexes("t").is_empty());
}

#[test]
fn reconcile_accepts_any_catalog_handle() {
    let ty = scored_type();
    let mut store = MemoryStore::new();
    let mut collection = store.collection(&ty).unwrap();

    let report = reconcile(&mut collection, &ty.indexes()[..1]).unwrap();

    assert_eq!(report.created, vec!["idx_name".to_string()]);
}

#[test]
fn repeated_field_is_created_instead_of_matching_a_wider_index() {
    let ty = EntityType::builder("Pair")
        .field(FieldDescriptor::string("a"))
        .field(FieldDescriptor::string("b"))
        .build()
        .unwrap();
    let a = ty.field("a").unwrap().clone();
    let declared = IndexDescriptor {
        name: "aa".into(),
        kind: IndexKind::NotUnique,
        fields: vec![a.clone(), a],
    };
    let mut store = MemoryStore::new().with_index(
        "Pair",
        StoreIndexDescriptor::new("ab", vec![IndexKey::asc("a"), IndexKey::asc("b")], false),
    );
    let mut collection = store.collection(&ty).unwrap();

    let report = reconcile(&mut collection, std::slice::from_ref(&declared)).unwrap();

    assert_eq!(report.created, vec!["aa".to_string()]);
    assert!(report.present.is_empty());
}

#[test]
fn type_with_a_repeated_index_field_is_rejected_up_front() {
    let err = EntityType::builder("Pair")
        .field(FieldDescriptor::string("a"))
        .field(FieldDescriptor::string("b"))
        .index("aa", ["a", "a"])
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::DuplicateIndexField { .. }));
}
