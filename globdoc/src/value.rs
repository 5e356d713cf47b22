use chrono::{DateTime, NaiveDate, Utc};

use crate::entity::Entity;
use crate::types::FieldKind;

/// A single stored field value. Each variant corresponds to exactly one [`FieldKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i32),
    Long(i64),
    Double(f64),
    String(String),
    Boolean(bool),
    Blob(Vec<u8>),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Reference(Entity),
    References(Vec<Entity>),
    StringArray(Vec<String>),
}

impl Value {
    pub fn kind(&self) -> FieldKind {
        match self {
            Value::Integer(_) => FieldKind::Integer,
            Value::Long(_) => FieldKind::Long,
            Value::Double(_) => FieldKind::Double,
            Value::String(_) => FieldKind::String,
            Value::Boolean(_) => FieldKind::Boolean,
            Value::Blob(_) => FieldKind::Blob,
            Value::Date(_) => FieldKind::Date,
            Value::DateTime(_) => FieldKind::DateTime,
            Value::Reference(_) => FieldKind::EntityReference,
            Value::References(_) => FieldKind::EntityReferenceArray,
            Value::StringArray(_) => FieldKind::StringArray,
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

value_from! {
    i32 => Integer,
    i64 => Long,
    f64 => Double,
    String => String,
    bool => Boolean,
    Vec<u8> => Blob,
    NaiveDate => Date,
    DateTime<Utc> => DateTime,
    Entity => Reference,
    Vec<Entity> => References,
    Vec<String> => StringArray,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}
