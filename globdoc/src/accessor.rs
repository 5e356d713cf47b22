//! Typed read adapters over a shared, rebindable entity slot.
//!
//! The bulk writer builds one [`Accessor`] per field of a type, all reading through the
//! same [`SharedEntityRef`]. Writing a record is then a matter of binding it to the
//! slot and letting the store pull every value through the accessors it was handed;
//! nothing is re-derived per record.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use chrono::{DateTime, NaiveDate, Utc};

use crate::entity::Entity;
use crate::errors::{MappingError, Result};
use crate::types::{EntityType, FieldDescriptor, FieldKind};
use crate::value::Value;

/// Single mutable slot holding the entity currently being written.
///
/// Clones share the slot. It is rebound once per entity by the bulk writer and read by
/// every accessor of the same type group. The slot is `Rc`-based and therefore cannot
/// leave the thread that created it; it must not be read while a rebind is in progress.
#[derive(Clone, Default)]
pub struct SharedEntityRef {
    slot: Rc<RefCell<Option<Entity>>>,
}

impl SharedEntityRef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `entity`, returning the previously bound one.
    pub fn bind(&self, entity: Entity) -> Option<Entity> {
        self.slot.replace(Some(entity))
    }

    pub fn clear(&self) -> Option<Entity> {
        self.slot.take()
    }

    pub fn is_bound(&self) -> bool {
        self.slot.borrow().is_some()
    }

    pub fn current(&self) -> Option<Entity> {
        self.slot.borrow().clone()
    }

    fn read<R>(&self, f: impl FnOnce(&Entity) -> Option<R>) -> Option<R> {
        self.slot.borrow().as_ref().and_then(f)
    }
}

impl fmt::Debug for SharedEntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedEntityRef")
            .field("bound", &self.slot.borrow().as_ref().map(|e| e.entity_type().name().to_string()))
            .finish()
    }
}

/// Extraction of a typed value out of a stored [`Value`].
pub trait FieldValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! field_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(inner) => Some(inner.clone()),
                        _ => None,
                    }
                }
            }
        )*
    };
}

field_value! {
    i32 => Integer,
    i64 => Long,
    f64 => Double,
    bool => Boolean,
    NaiveDate => Date,
    DateTime<Utc> => DateTime,
    String => String,
    Vec<u8> => Blob,
    Entity => Reference,
    Vec<Entity> => References,
}

#[derive(Clone)]
struct Binding {
    position: usize,
    shared: SharedEntityRef,
}

impl Binding {
    fn new(field: &FieldDescriptor, shared: &SharedEntityRef) -> Self {
        Self {
            position: field.position,
            shared: shared.clone(),
        }
    }

    fn typed<T: FieldValue>(&self) -> Option<T> {
        self.shared.read(|entity| entity.value_at(self.position).and_then(T::from_value))
    }

    fn untyped(&self) -> Option<Value> {
        self.shared.read(|entity| entity.value_at(self.position).cloned())
    }
}

/// Accessor for numeric, boolean and temporal fields.
#[derive(Clone)]
pub struct ScalarAccessor<T> {
    binding: Binding,
    _marker: PhantomData<fn() -> T>,
}

impl<T: FieldValue> ScalarAccessor<T> {
    fn new(field: &FieldDescriptor, shared: &SharedEntityRef) -> Self {
        Self {
            binding: Binding::new(field, shared),
            _marker: PhantomData,
        }
    }

    pub fn get(&self) -> Option<T> {
        self.binding.typed()
    }

    /// The bound entity's value, or `default` when it is absent.
    pub fn get_or(&self, default: T) -> T {
        self.get().unwrap_or(default)
    }

    /// True exactly when the bound entity has no value for this field.
    pub fn was_absent(&self) -> bool {
        self.get().is_none()
    }

    pub fn untyped_get(&self) -> Option<Value> {
        self.binding.untyped()
    }
}

/// Accessor for string, blob and entity-reference fields.
#[derive(Clone)]
pub struct ObjectAccessor<T> {
    binding: Binding,
    _marker: PhantomData<fn() -> T>,
}

impl<T: FieldValue> ObjectAccessor<T> {
    fn new(field: &FieldDescriptor, shared: &SharedEntityRef) -> Self {
        Self {
            binding: Binding::new(field, shared),
            _marker: PhantomData,
        }
    }

    pub fn get(&self) -> Option<T> {
        self.binding.typed()
    }

    pub fn untyped_get(&self) -> Option<Value> {
        self.binding.untyped()
    }
}

/// One typed read adapter per writable field kind.
#[derive(Clone)]
pub enum Accessor {
    Integer(ScalarAccessor<i32>),
    Long(ScalarAccessor<i64>),
    Double(ScalarAccessor<f64>),
    Boolean(ScalarAccessor<bool>),
    Date(ScalarAccessor<NaiveDate>),
    DateTime(ScalarAccessor<DateTime<Utc>>),
    String(ObjectAccessor<String>),
    Blob(ObjectAccessor<Vec<u8>>),
    Reference(ObjectAccessor<Entity>),
    References(ObjectAccessor<Vec<Entity>>),
}

impl Accessor {
    pub fn kind(&self) -> FieldKind {
        match self {
            Accessor::Integer(_) => FieldKind::Integer,
            Accessor::Long(_) => FieldKind::Long,
            Accessor::Double(_) => FieldKind::Double,
            Accessor::Boolean(_) => FieldKind::Boolean,
            Accessor::Date(_) => FieldKind::Date,
            Accessor::DateTime(_) => FieldKind::DateTime,
            Accessor::String(_) => FieldKind::String,
            Accessor::Blob(_) => FieldKind::Blob,
            Accessor::Reference(_) => FieldKind::EntityReference,
            Accessor::References(_) => FieldKind::EntityReferenceArray,
        }
    }

    /// Current value without its static type.
    pub fn untyped_get(&self) -> Option<Value> {
        match self {
            Accessor::Integer(accessor) => accessor.untyped_get(),
            Accessor::Long(accessor) => accessor.untyped_get(),
            Accessor::Double(accessor) => accessor.untyped_get(),
            Accessor::Boolean(accessor) => accessor.untyped_get(),
            Accessor::Date(accessor) => accessor.untyped_get(),
            Accessor::DateTime(accessor) => accessor.untyped_get(),
            Accessor::String(accessor) => accessor.untyped_get(),
            Accessor::Blob(accessor) => accessor.untyped_get(),
            Accessor::Reference(accessor) => accessor.untyped_get(),
            Accessor::References(accessor) => accessor.untyped_get(),
        }
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Accessor::{:?}", self.kind())
    }
}

/// Build the accessor for `field`, reading through `shared`.
///
/// Fails with [`MappingError::UnsupportedFieldKind`] for kinds that cannot be written.
pub fn dispatch(entity_type: &EntityType, field: &FieldDescriptor, shared: &SharedEntityRef) -> Result<Accessor> {
    let accessor = match field.kind {
        FieldKind::Integer => Accessor::Integer(ScalarAccessor::new(field, shared)),
        FieldKind::Long => Accessor::Long(ScalarAccessor::new(field, shared)),
        FieldKind::Double => Accessor::Double(ScalarAccessor::new(field, shared)),
        FieldKind::Boolean => Accessor::Boolean(ScalarAccessor::new(field, shared)),
        FieldKind::Date => Accessor::Date(ScalarAccessor::new(field, shared)),
        FieldKind::DateTime => Accessor::DateTime(ScalarAccessor::new(field, shared)),
        FieldKind::String => Accessor::String(ObjectAccessor::new(field, shared)),
        FieldKind::Blob => Accessor::Blob(ObjectAccessor::new(field, shared)),
        FieldKind::EntityReference => Accessor::Reference(ObjectAccessor::new(field, shared)),
        FieldKind::EntityReferenceArray => Accessor::References(ObjectAccessor::new(field, shared)),
        FieldKind::StringArray => {
            return Err(MappingError::UnsupportedFieldKind {
                entity_type: entity_type.name().to_string(),
                field: field.name.clone(),
                kind: field.kind,
            });
        }
    };
    Ok(accessor)
}

/// Build accessors for every field of `entity_type`, in field order.
///
/// Either every field gets an accessor or the first failure is returned; a partial set
/// is never produced.
pub fn dispatch_all(entity_type: &EntityType, shared: &SharedEntityRef) -> Result<Vec<(FieldDescriptor, Accessor)>> {
    entity_type
        .fields()
        .iter()
        .map(|field| dispatch(entity_type, field, shared).map(|accessor| (field.clone(), accessor)))
        .collect()
}
