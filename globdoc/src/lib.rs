//! globdoc maps typed entity definitions onto document stores.
//!
//! Two operations make up the core:
//!
//! - [`reconcile`] compares a type's declared indexes with the store's live index
//!   metadata and creates the missing ones. It never drops or alters an index.
//! - [`fill`] writes a mixed batch of entities, one bulk request per entity type, reading
//!   field values through accessors dispatched once per type.
//!
//! ```text
//! let user = EntityType::builder("User")
//!     .field(FieldDescriptor::integer("id").key().identity())
//!     .field(FieldDescriptor::string("login"))
//!     .unique_index("login_index", ["login"])
//!     .build()?;
//!
//! let mut store = RedisStore::connect(&MapperConfig::from_path("globdoc.toml")?)?;
//! reconcile_type(&mut store, &user)?;
//! fill(&mut store, entities)?;
//! ```
//!
//! Everything is synchronous and single-threaded: store calls block, and the shared
//! entity slot behind the accessors is not `Send`.

pub mod accessor;
pub mod bulk;
pub mod config;
pub mod entity;
pub mod errors;
pub mod id;
pub mod indexes;
pub mod keys;
pub mod naming;
pub mod registry;
pub mod store;
pub mod types;
pub mod value;

pub use accessor::{Accessor, ObjectAccessor, ScalarAccessor, SharedEntityRef, dispatch, dispatch_all};
pub use bulk::{EntityGroup, FillReport, GroupReport, fill, fill_group, group_by_type};
pub use config::{MapperConfig, RedisSettings, ReferenceEncoding, StoreSettings};
pub use entity::{Entity, EntityBuilder};
pub use errors::*;
pub use indexes::{
    IndexKey, IndexOptions, ReconcileReport, SortOrder, StoreIndexDescriptor, reconcile, reconcile_type,
};
pub use naming::{IDENTITY_FIELD_NAME, store_name};
pub use registry::TypeRegistry;
pub use store::{BulkRequest, CreateBuilder, DocumentStore, IndexCatalog, MemoryStore, RedisStore};
pub use types::{EntityType, EntityTypeBuilder, FieldDescriptor, FieldKind, IndexDescriptor, IndexKind};
pub use value::Value;

// Re-export redis so users don't need to depend on a specific redis version
pub use redis;
