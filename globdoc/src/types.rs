use std::collections::HashSet;
use std::sync::Arc;

use crate::errors::SchemaError;
use crate::naming::store_name;

/// Closed set of field kinds understood by the mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Integer,
    Long,
    Double,
    String,
    Boolean,
    Blob,
    /// Calendar date without a time component.
    Date,
    /// UTC instant.
    DateTime,
    /// A single embedded or referenced entity of the field's target type.
    EntityReference,
    /// An ordered list of entities of the field's target type.
    EntityReferenceArray,
    /// Part of the metadata model, but has no write accessor.
    StringArray,
}

impl FieldKind {
    pub const fn is_reference(self) -> bool {
        matches!(self, FieldKind::EntityReference | FieldKind::EntityReferenceArray)
    }

    pub const fn is_numeric(self) -> bool {
        matches!(self, FieldKind::Integer | FieldKind::Long | FieldKind::Double)
    }
}

/// Describes one field of an entity type.
///
/// Fields are created with one of the kind constructors and refined with the builder-style
/// modifiers:
///
/// ```text
/// FieldDescriptor::integer("id").key().identity()
/// FieldDescriptor::string("label").store_name("lbl")
/// FieldDescriptor::reference("owner", "User")
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    pub key: bool,
    pub nullable: bool,
    /// Marks the key field that the store uses as its document identity.
    pub identity: bool,
    /// Explicit attribute name in the store, taking precedence over every other naming rule.
    pub store_name: Option<String>,
    /// Target type name for reference kinds.
    pub target: Option<String>,
    /// Position within the owning type. Assigned when the type is built.
    pub position: usize,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            key: false,
            nullable: false,
            identity: false,
            store_name: None,
            target: None,
            position: 0,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn long(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Long)
    }

    pub fn double(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Double)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn blob(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Blob)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub fn date_time(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::DateTime)
    }

    pub fn string_array(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::StringArray)
    }

    pub fn reference(name: impl Into<String>, target: impl Into<String>) -> Self {
        let mut field = Self::new(name, FieldKind::EntityReference);
        field.target = Some(target.into());
        field
    }

    pub fn reference_array(name: impl Into<String>, target: impl Into<String>) -> Self {
        let mut field = Self::new(name, FieldKind::EntityReferenceArray);
        field.target = Some(target.into());
        field
    }

    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn store_name(mut self, name: impl Into<String>) -> Self {
        self.store_name = Some(name.into());
        self
    }
}

/// Declared uniqueness of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexKind {
    Unique,
    #[default]
    NotUnique,
}

impl IndexKind {
    pub const fn is_unique(self) -> bool {
        matches!(self, IndexKind::Unique)
    }
}

/// A declared index with its fields resolved against the owning type.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDescriptor {
    pub name: String,
    pub kind: IndexKind,
    /// Key fields in authored order.
    pub fields: Vec<FieldDescriptor>,
}

impl IndexDescriptor {
    pub fn is_unique(&self) -> bool {
        self.kind.is_unique()
    }
}

#[derive(Debug, Clone)]
struct IndexDeclaration {
    name: String,
    kind: IndexKind,
    fields: Vec<String>,
}

/// Named schema: ordered fields plus declared indexes.
///
/// Types are immutable once built and are shared behind an `Arc`. Two types are the
/// same runtime type only if they are the same allocation; see [`EntityType::same_type`].
#[derive(Debug)]
pub struct EntityType {
    name: String,
    collection: String,
    fields: Vec<FieldDescriptor>,
    indexes: Vec<IndexDescriptor>,
}

impl EntityType {
    pub fn builder(name: impl Into<String>) -> EntityTypeBuilder {
        EntityTypeBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store collection the type's documents live in.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn indexes(&self) -> &[IndexDescriptor] {
        &self.indexes
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn key_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|field| field.key)
    }

    pub fn same_type(left: &Arc<EntityType>, right: &Arc<EntityType>) -> bool {
        Arc::ptr_eq(left, right)
    }
}

pub struct EntityTypeBuilder {
    name: String,
    collection: Option<String>,
    fields: Vec<FieldDescriptor>,
    indexes: Vec<IndexDeclaration>,
}

impl EntityTypeBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection: None,
            fields: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Override the store collection name (defaults to the type name).
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn unique_index<I, S>(self, name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declare_index(name, IndexKind::Unique, fields)
    }

    pub fn index<I, S>(self, name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declare_index(name, IndexKind::NotUnique, fields)
    }

    fn declare_index<I, S>(mut self, name: impl Into<String>, kind: IndexKind, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indexes.push(IndexDeclaration {
            name: name.into(),
            kind,
            fields: fields.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn build(self) -> Result<Arc<EntityType>, SchemaError> {
        let mut seen = HashSet::new();
        let mut fields = self.fields;
        for (position, field) in fields.iter_mut().enumerate() {
            if !seen.insert(field.name.clone()) {
                return Err(SchemaError::DuplicateField {
                    entity_type: self.name,
                    field: field.name.clone(),
                });
            }
            if field.kind.is_reference() && field.target.is_none() {
                return Err(SchemaError::MissingReferenceTarget {
                    entity_type: self.name,
                    field: field.name.clone(),
                });
            }
            field.position = position;
        }

        let mut attributes = HashSet::new();
        for field in &fields {
            let attribute = store_name(field);
            if !attributes.insert(attribute) {
                return Err(SchemaError::DuplicateStoreName {
                    entity_type: self.name,
                    attribute: attribute.to_string(),
                });
            }
        }

        let mut index_names = HashSet::new();
        let mut indexes = Vec::with_capacity(self.indexes.len());
        for declaration in self.indexes {
            if !index_names.insert(declaration.name.clone()) {
                return Err(SchemaError::DuplicateIndex {
                    entity_type: self.name,
                    index: declaration.name,
                });
            }
            if declaration.fields.is_empty() {
                return Err(SchemaError::EmptyIndex {
                    entity_type: self.name,
                    index: declaration.name,
                });
            }
            let mut resolved: Vec<FieldDescriptor> = Vec::with_capacity(declaration.fields.len());
            for field_name in &declaration.fields {
                if resolved.iter().any(|field| &field.name == field_name) {
                    return Err(SchemaError::DuplicateIndexField {
                        entity_type: self.name,
                        index: declaration.name,
                        field: field_name.clone(),
                    });
                }
                match fields.iter().find(|field| &field.name == field_name) {
                    Some(field) => resolved.push(field.clone()),
                    None => {
                        return Err(SchemaError::UnknownIndexField {
                            entity_type: self.name,
                            index: declaration.name,
                            field: field_name.clone(),
                        });
                    }
                }
            }
            indexes.push(IndexDescriptor {
                name: declaration.name,
                kind: declaration.kind,
                fields: resolved,
            });
        }

        let collection = self.collection.unwrap_or_else(|| self.name.clone());
        Ok(Arc::new(EntityType {
            name: self.name,
            collection,
            fields,
            indexes,
        }))
    }
}
