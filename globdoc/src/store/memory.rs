//! In-process document store.
//!
//! Keeps documents and index descriptors per collection, enforces unique indexes on
//! write and records every store call in a journal. Failures can be injected at chosen
//! points to exercise error paths.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::accessor::Accessor;
use crate::config::ReferenceEncoding;
use crate::errors::{MappingError, Result};
use crate::indexes::{IndexKey, IndexOptions, StoreIndexDescriptor};
use crate::store::document::{Document, DocumentEncoder};
use crate::store::{BulkRequest, CreateBuilder, DocumentStore, IndexCatalog};
use crate::types::{EntityType, FieldDescriptor};

/// One call made against a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    ListIndexes { collection: String },
    CreateIndex { collection: String, descriptor: StoreIndexDescriptor },
    OpenBulk { collection: String },
    Write { collection: String, document: Document },
    CloseBulk { collection: String },
    /// A bulk request was dropped without being closed.
    ReleaseBulk { collection: String },
}

/// Where an injected failure fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    ListIndexes,
    CreateIndex,
    /// The n-th write unit executed by the store (1-based, counted across groups).
    Write(usize),
    Close,
}

#[derive(Debug, Default)]
struct MemoryCollection {
    indexes: Vec<StoreIndexDescriptor>,
    documents: Vec<Document>,
}

#[derive(Debug, Default)]
struct MemoryState {
    collections: HashMap<String, MemoryCollection>,
    journal: Vec<StoreEvent>,
    failure: Option<FailurePoint>,
    writes: usize,
}

impl MemoryState {
    fn collection_mut(&mut self, name: &str) -> &mut MemoryCollection {
        self.collections.entry(name.to_string()).or_default()
    }

    fn check(&self, point: FailurePoint) -> Result<()> {
        if self.failure == Some(point) {
            return Err(MappingError::store(format!("injected failure at {point:?}")));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: MemoryState,
    encoding: ReferenceEncoding,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference_encoding(mut self, encoding: ReferenceEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Seed `collection` with an existing index. Not recorded in the journal.
    pub fn with_index(mut self, collection: &str, descriptor: StoreIndexDescriptor) -> Self {
        self.state.collection_mut(collection).indexes.push(descriptor);
        self
    }

    pub fn fail_on(&mut self, point: FailurePoint) {
        self.state.failure = Some(point);
    }

    pub fn journal(&self) -> &[StoreEvent] {
        &self.state.journal
    }

    pub fn clear_journal(&mut self) {
        self.state.journal.clear();
    }

    pub fn documents(&self, collection: &str) -> &[Document] {
        self.state
            .collections
            .get(collection)
            .map(|c| c.documents.as_slice())
            .unwrap_or(&[])
    }

    pub fn indexes(&self, collection: &str) -> &[StoreIndexDescriptor] {
        self.state
            .collections
            .get(collection)
            .map(|c| c.indexes.as_slice())
            .unwrap_or(&[])
    }
}

impl DocumentStore for MemoryStore {
    type Collection<'a> = MemoryCollectionHandle<'a>;
    type Builder<'a> = MemoryCreateBuilder<'a>;

    fn collection(&mut self, entity_type: &EntityType) -> Result<Self::Collection<'_>> {
        Ok(MemoryCollectionHandle {
            name: entity_type.collection().to_string(),
            state: &mut self.state,
        })
    }

    fn create_builder(&mut self, entity_type: &Arc<EntityType>) -> Result<Self::Builder<'_>> {
        Ok(MemoryCreateBuilder {
            collection: entity_type.collection().to_string(),
            encoder: DocumentEncoder::new(self.encoding),
            state: &mut self.state,
        })
    }
}

pub struct MemoryCollectionHandle<'a> {
    name: String,
    state: &'a mut MemoryState,
}

impl IndexCatalog for MemoryCollectionHandle<'_> {
    fn list_indexes(&mut self) -> Result<Vec<StoreIndexDescriptor>> {
        self.state.journal.push(StoreEvent::ListIndexes {
            collection: self.name.clone(),
        });
        self.state.check(FailurePoint::ListIndexes)?;
        Ok(self.state.collection_mut(&self.name).indexes.clone())
    }

    fn create_index(&mut self, keys: &[IndexKey], options: &IndexOptions) -> Result<()> {
        let descriptor = StoreIndexDescriptor::new(options.name.clone(), keys.to_vec(), options.unique);
        self.state.journal.push(StoreEvent::CreateIndex {
            collection: self.name.clone(),
            descriptor: descriptor.clone(),
        });
        self.state.check(FailurePoint::CreateIndex)?;
        self.state.collection_mut(&self.name).indexes.push(descriptor);
        Ok(())
    }
}

pub struct MemoryCreateBuilder<'a> {
    collection: String,
    encoder: DocumentEncoder,
    state: &'a mut MemoryState,
}

impl<'a> CreateBuilder for MemoryCreateBuilder<'a> {
    type Request = MemoryBulkRequest<'a>;

    fn set_field(&mut self, field: &FieldDescriptor, accessor: Accessor) {
        self.encoder.push(field, accessor);
    }

    fn bulk_request(self) -> Result<Self::Request> {
        self.state.journal.push(StoreEvent::OpenBulk {
            collection: self.collection.clone(),
        });
        Ok(MemoryBulkRequest {
            collection: self.collection,
            encoder: self.encoder,
            state: self.state,
            closed: false,
        })
    }
}

pub struct MemoryBulkRequest<'a> {
    collection: String,
    encoder: DocumentEncoder,
    state: &'a mut MemoryState,
    closed: bool,
}

impl BulkRequest for MemoryBulkRequest<'_> {
    fn run(&mut self) -> Result<()> {
        self.state.writes += 1;
        self.state.check(FailurePoint::Write(self.state.writes))?;
        let document = self.encoder.encode()?;

        let collection = self.state.collection_mut(&self.collection);
        if let Some(index) = violated_unique_index(collection, &document) {
            return Err(MappingError::store(format!(
                "duplicate key for unique index '{}' on '{}'",
                index, self.collection
            )));
        }
        collection.documents.push(document.clone());
        self.state.journal.push(StoreEvent::Write {
            collection: self.collection.clone(),
            document,
        });
        Ok(())
    }

    fn close(mut self) -> Result<()> {
        self.state.check(FailurePoint::Close)?;
        self.closed = true;
        self.state.journal.push(StoreEvent::CloseBulk {
            collection: self.collection.clone(),
        });
        Ok(())
    }
}

impl Drop for MemoryBulkRequest<'_> {
    fn drop(&mut self) {
        if !self.closed {
            self.state.journal.push(StoreEvent::ReleaseBulk {
                collection: self.collection.clone(),
            });
        }
    }
}

/// Name of the first unique index that `document` would duplicate. Documents missing any
/// of an index's attributes do not participate in it.
fn violated_unique_index(collection: &MemoryCollection, document: &Document) -> Option<String> {
    collection
        .indexes
        .iter()
        .filter(|index| index.unique)
        .find(|index| {
            let Some(candidate) = index_values(index, document) else {
                return false;
            };
            collection
                .documents
                .iter()
                .any(|existing| index_values(index, existing).as_ref() == Some(&candidate))
        })
        .map(|index| index.name.clone())
}

fn index_values<'d>(index: &StoreIndexDescriptor, document: &'d Document) -> Option<Vec<&'d JsonValue>> {
    index.key.iter().map(|key| document.get(&key.attribute)).collect()
}
