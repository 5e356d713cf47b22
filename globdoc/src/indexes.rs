//! Reconciliation of declared indexes against the store's live index metadata.
//!
//! Reconciliation is additive: missing indexes are created, existing ones are never
//! altered or dropped, including indexes that are no longer declared.

use std::collections::HashSet;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::Result;
use crate::naming::store_name;
use crate::store::{DocumentStore, IndexCatalog};
use crate::types::{EntityType, IndexDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Store marker for the order: `1` ascending, `-1` descending.
    #[inline]
    pub const fn marker(self) -> i32 {
        match self {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        }
    }

    pub const fn from_marker(marker: i64) -> Option<Self> {
        match marker {
            1 => Some(SortOrder::Asc),
            -1 => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// One attribute of an index key document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexKey {
    pub attribute: String,
    pub order: SortOrder,
}

impl IndexKey {
    pub fn asc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            order: SortOrder::Asc,
        }
    }
}

/// Snapshot of one live index as reported by the store.
///
/// Serialises as `{"name": ..., "key": {"attr": 1, ...}, "unique": bool}`, keeping key
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreIndexDescriptor {
    pub name: String,
    #[serde(with = "key_map")]
    pub key: Vec<IndexKey>,
    #[serde(default)]
    pub unique: bool,
}

impl StoreIndexDescriptor {
    pub fn new(name: impl Into<String>, key: Vec<IndexKey>, unique: bool) -> Self {
        Self {
            name: name.into(),
            key,
            unique,
        }
    }
}

/// Options passed along with a create-index call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOptions {
    pub unique: bool,
    pub name: String,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Declared indexes created by this pass, in declaration order.
    pub created: Vec<String>,
    /// Declared indexes that already had a structural match.
    pub present: Vec<String>,
}

/// Ensure every index in `declared` exists on `collection`.
///
/// Live indexes are listed once. A declared index matches a live one when the resolved
/// store names of its fields and the live key attributes form the same set; order and
/// direction are ignored. Each unmatched index is created with
/// an ascending key document in declaration order.
pub fn reconcile<C>(collection: &mut C, declared: &[IndexDescriptor]) -> Result<ReconcileReport>
where
    C: IndexCatalog + ?Sized,
{
    let mut report = ReconcileReport::default();
    if declared.is_empty() {
        return Ok(report);
    }

    let existing = collection.list_indexes()?;
    for index in declared {
        if existing.iter().any(|descriptor| matches_descriptor(index, descriptor)) {
            report.present.push(index.name.clone());
            continue;
        }

        let keys = key_document(index);
        log::info!("create index {} => {}", index.name, DisplayKeys(&keys));
        let options = IndexOptions {
            unique: index.is_unique(),
            name: index.name.clone(),
        };
        collection.create_index(&keys, &options)?;
        report.created.push(index.name.clone());
    }

    Ok(report)
}

/// Reconcile the declared indexes of `entity_type` against its collection in `store`.
pub fn reconcile_type<S>(store: &mut S, entity_type: &EntityType) -> Result<ReconcileReport>
where
    S: DocumentStore + ?Sized,
{
    let mut collection = store.collection(entity_type)?;
    reconcile(&mut collection, entity_type.indexes())
}

/// True when both sides cover the same set of resolved attribute names.
pub fn matches_descriptor(index: &IndexDescriptor, descriptor: &StoreIndexDescriptor) -> bool {
    let declared: HashSet<&str> = index.fields.iter().map(store_name).collect();
    let live: HashSet<&str> = descriptor.key.iter().map(|key| key.attribute.as_str()).collect();
    declared == live
}

/// Ascending key document for `index`, in declared field order.
pub fn key_document(index: &IndexDescriptor) -> Vec<IndexKey> {
    index.fields.iter().map(|field| IndexKey::asc(store_name(field))).collect()
}

struct DisplayKeys<'a>(&'a [IndexKey]);

impl fmt::Display for DisplayKeys<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", key.attribute, key.order.marker())?;
        }
        f.write_str("}")
    }
}

mod key_map {
    use super::*;

    pub fn serialize<S>(keys: &[IndexKey], serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(keys.len()))?;
        for key in keys {
            map.serialize_entry(&key.attribute, &key.order.marker())?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Vec<IndexKey>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(KeyDocumentVisitor)
    }

    struct KeyDocumentVisitor;

    impl<'de> Visitor<'de> for KeyDocumentVisitor {
        type Value = Vec<IndexKey>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of attribute names to 1 or -1")
        }

        fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut keys = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((attribute, marker)) = access.next_entry::<String, i64>()? {
                let order = SortOrder::from_marker(marker)
                    .ok_or_else(|| de::Error::custom(format!("invalid sort marker {marker} for '{attribute}'")))?;
                keys.push(IndexKey { attribute, order });
            }
            Ok(keys)
        }
    }
}
