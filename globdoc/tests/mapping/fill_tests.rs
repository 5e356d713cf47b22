use super::support::*;

#[test]
fn mixed_batch_is_written_one_request_per_type() {
    init_logging();
    let (scored_ty, user_ty) = (scored_type(), user_type());
    let batch = vec![
        user(&user_ty, 1, "alice"),
        scored(&scored_ty, 10, "x"),
        user(&user_ty, 2, "bob"),
        scored(&scored_ty, 11, "y"),
        user(&user_ty, 3, "carol"),
    ];
    let mut store = MemoryStore::new();

    let report = fill(&mut store, batch).expect("fill");

    let groups: Vec<(&str, usize)> = report
        .groups
        .iter()
        .map(|g| (g.entity_type.as_str(), g.written))
        .collect();
    assert_eq!(groups, vec![("User", 3), ("T", 2)]);
    assert_eq!(report.written(), 5);
    assert_eq!(
        trace(&store),
        vec![
            "open:users",
            "write:users",
            "write:users",
            "write:users",
            "close:users",
            "open:t",
            "write:t",
            "write:t",
            "close:t",
        ]
    );

    let logins: Vec<&serde_json::Value> = store.documents("users").iter().map(|d| &d["lg"]).collect();
    assert_eq!(logins, vec![&json!("alice"), &json!("bob"), &json!("carol")]);
    assert_eq!(store.documents("users")[0]["_id"], json!(1));
    assert_eq!(store.documents("t")[1]["id"], json!(11));
}

#[test]
fn every_field_kind_reaches_the_document() {
    let ty = dummy_type();
    let entity = Entity::builder(&ty)
        .set("id", 1)
        .and_then(|b| b.set("name", "dummy"))
        .and_then(|b| b.set("value", 3.5))
        .and_then(|b| b.set("present", true))
        .and_then(|b| b.set("date", NaiveDate::from_ymd_opt(2023, 12, 24).unwrap()))
        .and_then(|b| b.set("created_at", 1_700_000_000_000_i64))
        .and_then(|b| b.set("password", b"pw".to_vec()))
        .and_then(|b| b.set("real_date_time", Utc.with_ymd_and_hms(2023, 12, 24, 18, 0, 0).unwrap()))
        .unwrap()
        .build();
    let mut store = MemoryStore::new();

    fill(&mut store, vec![entity]).unwrap();

    let document = serde_json::Value::Object(store.documents("dummies")[0].clone());
    assert_eq!(
        document,
        json!({
            "_id": 1,
            "name": "dummy",
            "value": 3.5,
            "present": true,
            "date": "2023-12-24",
            "created_at": 1_700_000_000_000_i64,
            "password": "cHc=",
            "real_date_time": "2023-12-24T18:00:00.000Z",
        })
    );
}

#[test]
fn empty_group_opens_and_closes_without_writing() {
    let ty = scored_type();
    let mut store = MemoryStore::new();

    let written = fill_group(&mut store, &ty, Vec::new()).expect("empty group");

    assert_eq!(written, 0);
    assert_eq!(trace(&store), vec!["open:t", "close:t"]);
    assert!(store.documents("t").is_empty());
}

#[test]
fn empty_batch_touches_nothing() {
    let mut store = MemoryStore::new();
    let report = fill(&mut store, Vec::new()).unwrap();
    assert!(report.groups.is_empty());
    assert!(store.journal().is_empty());
}

#[test]
fn unsupported_kind_aborts_before_opening_a_request() {
    let (scored_ty, aliased_ty) = (scored_type(), aliased_type());
    let aliased = Entity::builder(&aliased_ty)
        .set("id", 1)
        .and_then(|b| b.set("alias", vec!["a".to_string()]))
        .unwrap()
        .build();
    let batch = vec![scored(&scored_ty, 1, "x"), aliased, scored(&scored_ty, 2, "y")];
    let mut store = MemoryStore::new();

    let err = fill(&mut store, batch).unwrap_err();

    assert!(matches!(
        err,
        MappingError::UnsupportedFieldKind { ref field, kind: FieldKind::StringArray, .. } if field == "alias"
    ));
    assert_eq!(trace(&store), vec!["open:t", "write:t", "write:t", "close:t"]);
    assert!(store.documents("Aliased").is_empty());
}

#[test]
fn write_failure_releases_the_request_and_stops_the_batch() {
    let (scored_ty, user_ty) = (scored_type(), user_type());
    let batch = vec![
        scored(&scored_ty, 1, "a"),
        scored(&scored_ty, 2, "b"),
        scored(&scored_ty, 3, "c"),
        user(&user_ty, 1, "alice"),
    ];
    let mut store = MemoryStore::new();
    store.fail_on(FailurePoint::Write(2));

    let err = fill(&mut store, batch).unwrap_err();

    assert!(err.is_store_failure());
    assert_eq!(trace(&store), vec!["open:t", "write:t", "release:t"]);
    assert_eq!(store.documents("t").len(), 1);
    assert!(store.documents("users").is_empty());
}

#[test]
fn close_failure_still_releases_the_request() {
    let ty = scored_type();
    let mut store = MemoryStore::new();
    store.fail_on(FailurePoint::Close);

    let err = fill(&mut store, vec![scored(&ty, 1, "a")]).unwrap_err();

    assert!(err.is_store_failure());
    assert_eq!(trace(&store), vec!["open:t", "write:t", "release:t"]);
}

#[test]
fn foreign_entity_in_a_group_is_rejected() {
    let (scored_ty, user_ty) = (scored_type(), user_type());
    let mut store = MemoryStore::new();

    let err = fill_group(
        &mut store,
        &scored_ty,
        vec![scored(&scored_ty, 1, "a"), user(&user_ty, 1, "alice")],
    )
    .unwrap_err();

    assert!(matches!(err, MappingError::Schema(SchemaError::EntityTypeMismatch { .. })));
    assert_eq!(trace(&store), vec!["open:t", "write:t", "release:t"]);
}

#[test]
fn reconciled_unique_index_is_enforced_on_write() {
    let ty = scored_type();
    let mut store = MemoryStore::new();
    reconcile_type(&mut store, &ty).unwrap();

    let err = fill(&mut store, vec![scored(&ty, 1, "same"), scored(&ty, 2, "same")]).unwrap_err();

    assert!(err.to_string().contains("idx_name"));
    assert_eq!(store.documents("t").len(), 1);
}

#[test]
fn references_are_embedded_by_default() {
    let (user_ty, ticket_ty) = (user_type(), ticket_type());
    let ticket = Entity::builder(&ticket_ty)
        .set("code", "T-1")
        .and_then(|b| b.set("owner", user(&user_ty, 1, "alice")))
        .and_then(|b| b.set("watchers", vec![user(&user_ty, 2, "bob"), user(&user_ty, 3, "carol")]))
        .unwrap()
        .build();
    let mut store = MemoryStore::new();

    fill(&mut store, vec![ticket]).unwrap();

    let document = &store.documents("tickets")[0];
    assert_eq!(document["owner"], json!({ "_id": 1, "lg": "alice" }));
    assert_eq!(document["watchers"][1], json!({ "_id": 3, "lg": "carol" }));
}

#[test]
fn references_can_be_written_as_db_refs() {
    let (user_ty, ticket_ty) = (user_type(), ticket_type());
    let ticket = Entity::builder(&ticket_ty)
        .set("code", "T-2")
        .and_then(|b| b.set("owner", user(&user_ty, 7, "dave")))
        .unwrap()
        .build();
    let mut store = MemoryStore::new().with_reference_encoding(ReferenceEncoding::DbRef);

    fill(&mut store, vec![ticket]).unwrap();

    let document = &store.documents("tickets")[0];
    assert_eq!(document["owner"], json!({ "ref": "users", "id": 7 }));
    assert!(document.get("watchers").is_none());
}

#[test]
fn entities_are_not_retained_after_the_batch() {
    let ty = scored_type();
    let entity = scored(&ty, 1, "a");
    let kept = entity.clone();
    let mut store = MemoryStore::new();

    fill(&mut store, vec![entity]).unwrap();

    // Only the kept clone and the type's own handle remain.
    assert_eq!(Arc::strong_count(&ty), 2);
    drop(kept);
    assert_eq!(Arc::strong_count(&ty), 1);
}

#[test]
fn identity_cannot_be_shadowed_by_a_field_named_like_it() {
    let err = EntityType::builder("Shadowed")
        .field(FieldDescriptor::integer("id").key().identity())
        .field(FieldDescriptor::integer("_id"))
        .build()
        .unwrap_err();

    assert_eq!(
        err,
        SchemaError::DuplicateStoreName {
            entity_type: "Shadowed".into(),
            attribute: "_id".into(),
        }
    );
}
