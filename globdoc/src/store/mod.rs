//! Store collaborator surface consumed by the reconciler and the bulk writer.
//!
//! Every call is blocking. A [`DocumentStore`] hands out short-lived handles that borrow
//! it mutably, so at most one collection handle or bulk request is active at a time.

pub mod document;
pub mod memory;
pub mod redis_json;

use std::sync::Arc;

use crate::accessor::Accessor;
use crate::errors::Result;
use crate::indexes::{IndexKey, IndexOptions, StoreIndexDescriptor};
use crate::types::{EntityType, FieldDescriptor};

pub use document::DocumentEncoder;
pub use memory::{FailurePoint, MemoryStore, StoreEvent};
pub use redis_json::RedisStore;

/// Index metadata of one collection.
pub trait IndexCatalog {
    /// Every index currently defined on the collection.
    fn list_indexes(&mut self) -> Result<Vec<StoreIndexDescriptor>>;

    /// Create an index with the given key document. The store is not expected to
    /// deduplicate; callers check for existence first.
    fn create_index(&mut self, keys: &[IndexKey], options: &IndexOptions) -> Result<()>;
}

pub trait DocumentStore {
    type Collection<'a>: IndexCatalog
    where
        Self: 'a;

    type Builder<'a>: CreateBuilder
    where
        Self: 'a;

    /// Handle on the collection holding `entity_type`'s documents.
    fn collection(&mut self, entity_type: &EntityType) -> Result<Self::Collection<'_>>;

    /// One create builder per type group.
    fn create_builder(&mut self, entity_type: &Arc<EntityType>) -> Result<Self::Builder<'_>>;
}

/// Collects the accessors of one type and opens the bulk request that writes through them.
pub trait CreateBuilder {
    type Request: BulkRequest;

    fn set_field(&mut self, field: &FieldDescriptor, accessor: Accessor);

    fn bulk_request(self) -> Result<Self::Request>;
}

/// A batched write scoped to one type group.
///
/// Dropping a request that was not closed releases it; implementations must not leak the
/// underlying handle on that path.
pub trait BulkRequest {
    /// Write one document for the entity currently bound to the group's shared reference.
    fn run(&mut self) -> Result<()>;

    /// Flush outstanding writes and release the request.
    fn close(self) -> Result<()>;
}
