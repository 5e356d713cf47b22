pub(crate) use chrono::{NaiveDate, TimeZone, Utc};
pub(crate) use globdoc::{
    Entity, EntityType, FieldDescriptor, FieldKind, IndexDescriptor, IndexKey, IndexKind, MappingError, MemoryStore,
    ReferenceEncoding, SchemaError, StoreIndexDescriptor, fill, fill_group, reconcile, reconcile_type,
    store::{DocumentStore, FailurePoint, StoreEvent},
};
pub(crate) use serde_json::json;
pub(crate) use std::sync::Arc;

pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `T { id: Integer (key), name: String, score: Double }` with a unique index on `name`
/// and a non-unique index on `id`.
pub(crate) fn scored_type() -> Arc<EntityType> {
    EntityType::builder("T")
        .collection("t")
        .field(FieldDescriptor::integer("id").key())
        .field(FieldDescriptor::string("name"))
        .field(FieldDescriptor::double("score"))
        .unique_index("idx_name", ["name"])
        .index("idx_id", ["id"])
        .build()
        .expect("valid type")
}

pub(crate) fn scored(ty: &Arc<EntityType>, id: i32, name: &str) -> Entity {
    Entity::builder(ty)
        .set("id", id)
        .and_then(|b| b.set("name", name))
        .expect("valid entity")
        .build()
}

pub(crate) fn dummy_type() -> Arc<EntityType> {
    EntityType::builder("DummyObject")
        .collection("dummies")
        .field(FieldDescriptor::integer("id").key().identity())
        .field(FieldDescriptor::string("name"))
        .field(FieldDescriptor::double("value"))
        .field(FieldDescriptor::integer("count").nullable())
        .field(FieldDescriptor::boolean("present"))
        .field(FieldDescriptor::date("date"))
        .field(FieldDescriptor::long("created_at"))
        .field(FieldDescriptor::blob("password"))
        .field(FieldDescriptor::date_time("real_date_time"))
        .index("date_index", ["date"])
        .build()
        .expect("valid type")
}

/// Same shape as [`dummy_type`] plus a string array, which has no write accessor.
pub(crate) fn aliased_type() -> Arc<EntityType> {
    EntityType::builder("Aliased")
        .field(FieldDescriptor::integer("id").key())
        .field(FieldDescriptor::string_array("alias"))
        .build()
        .expect("valid type")
}

pub(crate) fn user_type() -> Arc<EntityType> {
    EntityType::builder("User")
        .collection("users")
        .field(FieldDescriptor::integer("id").key().identity())
        .field(FieldDescriptor::string("login").store_name("lg"))
        .build()
        .expect("valid type")
}

pub(crate) fn ticket_type() -> Arc<EntityType> {
    EntityType::builder("Ticket")
        .collection("tickets")
        .field(FieldDescriptor::string("code").key())
        .field(FieldDescriptor::reference("owner", "User"))
        .field(FieldDescriptor::reference_array("watchers", "User"))
        .build()
        .expect("valid type")
}

pub(crate) fn user(ty: &Arc<EntityType>, id: i32, login: &str) -> Entity {
    Entity::builder(ty)
        .set("id", id)
        .and_then(|b| b.set("login", login))
        .expect("valid entity")
        .build()
}

/// Compact view of the store journal: `list:t`, `create:t:idx_name`, `open:t`, `write:t`,
/// `close:t`, `release:t`.
pub(crate) fn trace(store: &MemoryStore) -> Vec<String> {
    store
        .journal()
        .iter()
        .map(|event| match event {
            StoreEvent::ListIndexes { collection } => format!("list:{collection}"),
            StoreEvent::CreateIndex { collection, descriptor } => {
                format!("create:{collection}:{}", descriptor.name)
            }
            StoreEvent::OpenBulk { collection } => format!("open:{collection}"),
            StoreEvent::Write { collection, .. } => format!("write:{collection}"),
            StoreEvent::CloseBulk { collection } => format!("close:{collection}"),
            StoreEvent::ReleaseBulk { collection } => format!("release:{collection}"),
        })
        .collect()
}

pub(crate) fn created_indexes(store: &MemoryStore) -> Vec<StoreIndexDescriptor> {
    store
        .journal()
        .iter()
        .filter_map(|event| match event {
            StoreEvent::CreateIndex { descriptor, .. } => Some(descriptor.clone()),
            _ => None,
        })
        .collect()
}
