//! Grouped, type-directed bulk writes.
//!
//! A mixed batch is split into one group per runtime entity type. Each group gets one
//! accessor set, one create builder and one bulk request; entities are streamed through
//! the request by rebinding a shared reference, so per-record work is limited to the
//! write itself.

use std::collections::HashMap;
use std::sync::Arc;

use crate::accessor::{SharedEntityRef, dispatch_all};
use crate::entity::Entity;
use crate::errors::{Result, SchemaError};
use crate::store::{BulkRequest, CreateBuilder, DocumentStore};
use crate::types::EntityType;

/// Entities of one type, in input order.
#[derive(Debug)]
pub struct EntityGroup {
    pub entity_type: Arc<EntityType>,
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReport {
    pub entity_type: String,
    pub written: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    /// One entry per group, in processing order.
    pub groups: Vec<GroupReport>,
}

impl FillReport {
    pub fn written(&self) -> usize {
        self.groups.iter().map(|group| group.written).sum()
    }
}

/// Partition `entities` by exact runtime type.
///
/// Groups come out in the order their type was first seen; entities keep their input
/// order within a group. Types are compared by identity, not by name.
pub fn group_by_type(entities: impl IntoIterator<Item = Entity>) -> Vec<EntityGroup> {
    let mut groups: Vec<EntityGroup> = Vec::new();
    let mut slots: HashMap<*const EntityType, usize> = HashMap::new();
    for entity in entities {
        let slot = *slots.entry(Arc::as_ptr(entity.entity_type())).or_insert_with(|| {
            groups.push(EntityGroup {
                entity_type: Arc::clone(entity.entity_type()),
                entities: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].entities.push(entity);
    }
    groups
}

/// Write a mixed batch, one bulk request per type group.
///
/// Groups are processed sequentially in first-seen order. The first failure aborts the
/// call; groups already written stay written.
pub fn fill<S>(store: &mut S, entities: impl IntoIterator<Item = Entity>) -> Result<FillReport>
where
    S: DocumentStore,
{
    let mut report = FillReport::default();
    for group in group_by_type(entities) {
        let written = fill_group(store, &group.entity_type, group.entities)?;
        report.groups.push(GroupReport {
            entity_type: group.entity_type.name().to_string(),
            written,
        });
    }
    Ok(report)
}

/// Write `entities`, all of type `entity_type`, through a single bulk request.
///
/// The full accessor set is dispatched before the store is touched, so an unsupported
/// field kind fails without opening a request. Once opened, the request is closed on
/// success and released by drop on every other path. An empty group opens and closes the
/// request without writing.
pub fn fill_group<S>(
    store: &mut S,
    entity_type: &Arc<EntityType>,
    entities: impl IntoIterator<Item = Entity>,
) -> Result<usize>
where
    S: DocumentStore,
{
    let shared = SharedEntityRef::new();
    let accessors = dispatch_all(entity_type, &shared)?;

    let mut builder = store.create_builder(entity_type)?;
    for (field, accessor) in accessors {
        builder.set_field(&field, accessor);
    }
    let mut request = builder.bulk_request()?;

    let mut written = 0;
    for entity in entities {
        if !EntityType::same_type(entity.entity_type(), entity_type) {
            return Err(SchemaError::EntityTypeMismatch {
                expected: entity_type.name().to_string(),
                actual: entity.entity_type().name().to_string(),
            }
            .into());
        }
        shared.bind(entity);
        request.run()?;
        written += 1;
    }
    shared.clear();
    request.close()?;

    log::debug!("wrote {written} {} entities to '{}'", entity_type.name(), entity_type.collection());
    Ok(written)
}
