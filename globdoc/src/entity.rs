use std::fmt;
use std::sync::Arc;

use crate::errors::SchemaError;
use crate::types::{EntityType, FieldDescriptor};
use crate::value::Value;

/// Immutable record of exactly one [`EntityType`].
///
/// Values are checked against their field's kind when set, so readers can rely on a
/// present value having the variant that matches the field. Cloning is cheap: the type
/// and the value storage are shared.
#[derive(Clone)]
pub struct Entity {
    entity_type: Arc<EntityType>,
    values: Arc<[Option<Value>]>,
}

impl Entity {
    pub fn builder(entity_type: &Arc<EntityType>) -> EntityBuilder {
        EntityBuilder {
            entity_type: Arc::clone(entity_type),
            values: vec![None; entity_type.fields().len()],
        }
    }

    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.entity_type
    }

    /// Value stored for `field`, or `None` when absent.
    pub fn get(&self, field: &FieldDescriptor) -> Option<&Value> {
        self.value_at(field.position)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        let field = self.entity_type.field(name)?;
        self.value_at(field.position)
    }

    pub fn value_at(&self, position: usize) -> Option<&Value> {
        self.values.get(position).and_then(Option::as_ref)
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        EntityType::same_type(&self.entity_type, &other.entity_type) && self.values == other.values
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entity_type.name())?;
        let mut map = f.debug_map();
        for field in self.entity_type.fields() {
            if let Some(value) = self.get(field) {
                map.entry(&field.name, value);
            }
        }
        map.finish()
    }
}

pub struct EntityBuilder {
    entity_type: Arc<EntityType>,
    values: Vec<Option<Value>>,
}

impl EntityBuilder {
    /// Set `field` to `value`, rejecting unknown fields, kind mismatches and references to
    /// entities of the wrong type.
    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Result<Self, SchemaError> {
        let value = value.into();
        let descriptor = self.entity_type.field(field).ok_or_else(|| SchemaError::UnknownField {
            entity_type: self.entity_type.name().to_string(),
            field: field.to_string(),
        })?;
        if value.kind() != descriptor.kind {
            return Err(SchemaError::KindMismatch {
                field: descriptor.name.clone(),
                expected: descriptor.kind,
                actual: value.kind(),
            });
        }
        if let Value::Double(number) = &value
            && !number.is_finite()
        {
            return Err(SchemaError::NonFiniteDouble {
                field: descriptor.name.clone(),
            });
        }
        check_reference_target(descriptor, &value)?;
        let position = descriptor.position;
        self.values[position] = Some(value);
        Ok(self)
    }

    /// Clear a previously set value, leaving the field absent.
    pub fn unset(mut self, field: &str) -> Result<Self, SchemaError> {
        let descriptor = self.entity_type.field(field).ok_or_else(|| SchemaError::UnknownField {
            entity_type: self.entity_type.name().to_string(),
            field: field.to_string(),
        })?;
        let position = descriptor.position;
        self.values[position] = None;
        Ok(self)
    }

    pub fn build(self) -> Entity {
        Entity {
            entity_type: self.entity_type,
            values: self.values.into(),
        }
    }
}

fn check_reference_target(field: &FieldDescriptor, value: &Value) -> Result<(), SchemaError> {
    let Some(target) = field.target.as_deref() else {
        return Ok(());
    };
    let referenced: &[Entity] = match value {
        Value::Reference(entity) => std::slice::from_ref(entity),
        Value::References(entities) => entities,
        _ => return Ok(()),
    };
    match referenced.iter().find(|entity| entity.entity_type().name() != target) {
        Some(entity) => Err(SchemaError::ReferenceTargetMismatch {
            field: field.name.clone(),
            expected: target.to_string(),
            actual: entity.entity_type().name().to_string(),
        }),
        None => Ok(()),
    }
}
