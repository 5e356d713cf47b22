//! Blocking Redis backend: RedisJSON documents, RediSearch indexes and an index catalog.
//!
//! Layout, for a store with prefix `globs` and database `main`:
//!
//! | Key                                   | Type | Content                               |
//! |---------------------------------------|------|---------------------------------------|
//! | `globs:main:{collection}:{id}`        | JSON | one document                          |
//! | `globs:main:{collection}:_indexes`    | hash | index name -> descriptor JSON         |
//! | `globs:main:idx:{collection}:{index}` | FT   | search index over the documents       |
//!
//! The catalog hash is the source of truth for reconciliation; RediSearch has no notion
//! of unique indexes, so uniqueness is recorded there but not enforced by Redis.

use std::sync::Arc;

use redis::{ConnectionLike, Pipeline, cmd, pipe};

use crate::accessor::Accessor;
use crate::config::{MapperConfig, ReferenceEncoding, StoreSettings};
use crate::errors::Result;
use crate::id::document_id_or_generate;
use crate::indexes::{IndexKey, IndexOptions, StoreIndexDescriptor};
use crate::keys::KeyContext;
use crate::naming::store_name;
use crate::store::document::DocumentEncoder;
use crate::store::{BulkRequest, CreateBuilder, DocumentStore, IndexCatalog};
use crate::types::{EntityType, FieldDescriptor, FieldKind};

const TAG_SEPARATOR: &str = "|";

pub struct RedisStore<C> {
    conn: C,
    prefix: String,
    database: String,
    batch_size: usize,
    encoding: ReferenceEncoding,
}

impl RedisStore<redis::Connection> {
    /// Open a blocking connection using `config`.
    pub fn connect(config: &MapperConfig) -> Result<Self> {
        let client = redis::Client::open(config.redis_url()?.as_str())?;
        let conn = client.get_connection()?;
        Ok(Self::new(conn, &config.store))
    }
}

impl<C: ConnectionLike> RedisStore<C> {
    pub fn new(conn: C, settings: &StoreSettings) -> Self {
        Self {
            conn,
            prefix: settings.prefix.clone(),
            database: settings.database.clone(),
            batch_size: settings.batch_size.max(1),
            encoding: settings.reference_encoding,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.conn
    }

    fn keys(&self) -> KeyContext<'_> {
        KeyContext::new(&self.prefix, &self.database)
    }
}

impl<C: ConnectionLike> DocumentStore for RedisStore<C> {
    type Collection<'a>
        = RedisCollection<'a, C>
    where
        Self: 'a;

    type Builder<'a>
        = RedisCreateBuilder<'a, C>
    where
        Self: 'a;

    fn collection(&mut self, entity_type: &EntityType) -> Result<Self::Collection<'_>> {
        let keys = self.keys();
        let collection = entity_type.collection();
        Ok(RedisCollection {
            catalog_key: keys.index_catalog(collection),
            document_prefix: keys.document_prefix(collection),
            search_prefix: keys.search_index(collection, ""),
            fields: entity_type.fields().to_vec(),
            conn: &mut self.conn,
        })
    }

    fn create_builder(&mut self, entity_type: &Arc<EntityType>) -> Result<Self::Builder<'_>> {
        Ok(RedisCreateBuilder {
            document_prefix: self.keys().document_prefix(entity_type.collection()),
            encoder: DocumentEncoder::new(self.encoding),
            batch_size: self.batch_size,
            conn: &mut self.conn,
        })
    }
}

pub struct RedisCollection<'a, C> {
    catalog_key: String,
    document_prefix: String,
    search_prefix: String,
    fields: Vec<FieldDescriptor>,
    conn: &'a mut C,
}

impl<C: ConnectionLike> RedisCollection<'_, C> {
    fn field_kind(&self, attribute: &str) -> Option<FieldKind> {
        self.fields
            .iter()
            .find(|field| store_name(field) == attribute)
            .map(|field| field.kind)
    }

    fn create_search_index(&mut self, keys: &[IndexKey], options: &IndexOptions) -> Result<()> {
        let mut command = cmd("FT.CREATE");
        command.arg(format!("{}{}", self.search_prefix, options.name));
        command.arg("ON").arg("JSON");
        command.arg("PREFIX").arg(1).arg(self.document_prefix.as_str());
        command.arg("SCHEMA");
        for key in keys {
            command.arg(format!("$.{}", key.attribute));
            command.arg("AS").arg(key.attribute.as_str());
            match self.field_kind(&key.attribute) {
                Some(kind) if kind.is_numeric() => {
                    command.arg("NUMERIC");
                }
                _ => {
                    command.arg("TAG").arg("SEPARATOR").arg(TAG_SEPARATOR);
                }
            }
            command.arg("SORTABLE");
        }

        if let Err(err) = command.query::<()>(&mut *self.conn) {
            if index_exists_error(&err) {
                return Ok(());
            }
            return Err(err.into());
        }
        Ok(())
    }
}

impl<C: ConnectionLike> IndexCatalog for RedisCollection<'_, C> {
    fn list_indexes(&mut self) -> Result<Vec<StoreIndexDescriptor>> {
        let entries: Vec<String> = cmd("HVALS").arg(self.catalog_key.as_str()).query(&mut *self.conn)?;
        let mut descriptors = entries
            .iter()
            .map(|entry| serde_json::from_str::<StoreIndexDescriptor>(entry))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(descriptors)
    }

    fn create_index(&mut self, keys: &[IndexKey], options: &IndexOptions) -> Result<()> {
        self.create_search_index(keys, options)?;
        let descriptor = StoreIndexDescriptor::new(options.name.clone(), keys.to_vec(), options.unique);
        let payload = serde_json::to_string(&descriptor)?;
        cmd("HSET")
            .arg(self.catalog_key.as_str())
            .arg(options.name.as_str())
            .arg(payload)
            .query::<()>(&mut *self.conn)?;
        Ok(())
    }
}

fn index_exists_error(err: &redis::RedisError) -> bool {
    let msg = err.to_string().to_ascii_lowercase();
    msg.contains("already exists") && msg.contains("index")
}

pub struct RedisCreateBuilder<'a, C> {
    document_prefix: String,
    encoder: DocumentEncoder,
    batch_size: usize,
    conn: &'a mut C,
}

impl<'a, C: ConnectionLike> CreateBuilder for RedisCreateBuilder<'a, C> {
    type Request = RedisBulkRequest<'a, C>;

    fn set_field(&mut self, field: &FieldDescriptor, accessor: Accessor) {
        self.encoder.push(field, accessor);
    }

    fn bulk_request(self) -> Result<Self::Request> {
        Ok(RedisBulkRequest {
            document_prefix: self.document_prefix,
            encoder: self.encoder,
            batch_size: self.batch_size,
            pipeline: pipe(),
            pending: 0,
            closed: false,
            conn: self.conn,
        })
    }
}

/// Pipelines one `JSON.SET` per entity, sending them every `batch_size` writes and on close.
pub struct RedisBulkRequest<'a, C: ConnectionLike> {
    document_prefix: String,
    encoder: DocumentEncoder,
    batch_size: usize,
    pipeline: Pipeline,
    pending: usize,
    closed: bool,
    conn: &'a mut C,
}

impl<C: ConnectionLike> RedisBulkRequest<'_, C> {
    fn flush(&mut self) -> Result<()> {
        if self.pending == 0 {
            return Ok(());
        }
        let pipeline = std::mem::replace(&mut self.pipeline, pipe());
        self.pending = 0;
        pipeline.query::<()>(&mut *self.conn)?;
        Ok(())
    }
}

impl<C: ConnectionLike> BulkRequest for RedisBulkRequest<'_, C> {
    fn run(&mut self) -> Result<()> {
        let document = self.encoder.encode()?;
        let id = document_id_or_generate(self.encoder.document_id());
        let payload = serde_json::to_string(&document)?;
        self.pipeline
            .cmd("JSON.SET")
            .arg(format!("{}{}", self.document_prefix, id))
            .arg("$")
            .arg(payload)
            .ignore();
        self.pending += 1;
        if self.pending >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    fn close(mut self) -> Result<()> {
        self.flush()?;
        self.closed = true;
        Ok(())
    }
}

impl<C: ConnectionLike> Drop for RedisBulkRequest<'_, C> {
    fn drop(&mut self) {
        if self.closed || self.pending == 0 {
            return;
        }
        let pending = self.pending;
        if let Err(err) = self.flush() {
            log::warn!(
                "discarding {pending} buffered writes under {}: {err}",
                self.document_prefix
            );
        }
    }
}
