//! JSON documents built from accessor values.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::SecondsFormat;
use serde_json::{Map, Value as JsonValue};

use crate::accessor::Accessor;
use crate::config::ReferenceEncoding;
use crate::entity::Entity;
use crate::errors::{Result, SchemaError};
use crate::id::compound_id;
use crate::naming::{REFERENCE_COLLECTION_EXT, REFERENCE_ID_EXT, store_name};
use crate::types::FieldDescriptor;
use crate::value::Value;

pub type Document = Map<String, JsonValue>;

struct EncodedField {
    attribute: String,
    key: bool,
    accessor: Accessor,
}

/// Turns the entity bound behind a set of accessors into a document.
///
/// Absent values are omitted from the document.
pub struct DocumentEncoder {
    fields: Vec<EncodedField>,
    encoding: ReferenceEncoding,
}

impl DocumentEncoder {
    pub fn new(encoding: ReferenceEncoding) -> Self {
        Self {
            fields: Vec::new(),
            encoding,
        }
    }

    pub fn push(&mut self, field: &FieldDescriptor, accessor: Accessor) {
        self.fields.push(EncodedField {
            attribute: store_name(field).to_string(),
            key: field.key,
            accessor,
        });
    }

    pub fn encode(&self) -> Result<Document> {
        let mut document = Map::with_capacity(self.fields.len());
        for field in &self.fields {
            if let Some(value) = field.accessor.untyped_get() {
                document.insert(field.attribute.clone(), encode_value(&value, self.encoding)?);
            }
        }
        Ok(document)
    }

    /// Key field values joined with `:`. `None` when the type has no key fields or a key
    /// value is absent.
    pub fn document_id(&self) -> Option<String> {
        compound_id(
            self.fields
                .iter()
                .filter(|field| field.key)
                .map(|field| field.accessor.untyped_get().as_ref().and_then(key_part)),
        )
    }
}

pub fn encode_value(value: &Value, encoding: ReferenceEncoding) -> Result<JsonValue> {
    let json = match value {
        Value::Integer(v) => JsonValue::from(*v),
        Value::Long(v) => JsonValue::from(*v),
        // Finite: entities reject NaN and infinities when built.
        Value::Double(v) => JsonValue::from(*v),
        Value::String(v) => JsonValue::from(v.as_str()),
        Value::Boolean(v) => JsonValue::from(*v),
        Value::Blob(bytes) => JsonValue::from(BASE64.encode(bytes)),
        Value::Date(date) => JsonValue::from(date.format("%Y-%m-%d").to_string()),
        Value::DateTime(instant) => JsonValue::from(instant.to_rfc3339_opts(SecondsFormat::Millis, true)),
        Value::Reference(entity) => encode_reference(entity, encoding)?,
        Value::References(entities) => JsonValue::Array(
            entities
                .iter()
                .map(|entity| encode_reference(entity, encoding))
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::StringArray(values) => JsonValue::from(values.clone()),
    };
    Ok(json)
}

/// Every present field of `entity` under its resolved attribute name.
pub fn encode_entity(entity: &Entity, encoding: ReferenceEncoding) -> Result<Document> {
    let mut document = Map::new();
    for field in entity.entity_type().fields() {
        if let Some(value) = entity.get(field) {
            document.insert(store_name(field).to_string(), encode_value(value, encoding)?);
        }
    }
    Ok(document)
}

fn encode_reference(entity: &Entity, encoding: ReferenceEncoding) -> Result<JsonValue> {
    match encoding {
        ReferenceEncoding::Embedded => Ok(JsonValue::Object(encode_entity(entity, encoding)?)),
        ReferenceEncoding::DbRef => {
            let id = reference_id(entity, encoding)?;
            let mut reference = Map::new();
            reference.insert(
                REFERENCE_COLLECTION_EXT.to_string(),
                JsonValue::from(entity.entity_type().collection()),
            );
            reference.insert(REFERENCE_ID_EXT.to_string(), id);
            Ok(JsonValue::Object(reference))
        }
    }
}

/// A single key is written with its own JSON type; a compound key as its joined parts.
fn reference_id(entity: &Entity, encoding: ReferenceEncoding) -> Result<JsonValue> {
    let missing = || SchemaError::MissingReferenceKey {
        entity_type: entity.entity_type().name().to_string(),
    };
    let keys: Vec<&Value> = entity
        .entity_type()
        .key_fields()
        .map(|field| entity.get(field).ok_or_else(missing))
        .collect::<std::result::Result<_, _>>()?;
    match keys.as_slice() {
        [] => Err(missing().into()),
        [single] => encode_value(single, encoding),
        parts => {
            let joined = compound_id(parts.iter().map(|value| key_part(value))).ok_or_else(missing)?;
            Ok(JsonValue::from(joined))
        }
    }
}

fn key_part(value: &Value) -> Option<String> {
    match value {
        Value::Integer(v) => Some(v.to_string()),
        Value::Long(v) => Some(v.to_string()),
        Value::Double(v) => Some(v.to_string()),
        Value::String(v) => Some(v.clone()),
        Value::Boolean(v) => Some(v.to_string()),
        Value::Date(date) => Some(date.format("%Y-%m-%d").to_string()),
        Value::DateTime(instant) => Some(instant.to_rfc3339_opts(SecondsFormat::Millis, true)),
        Value::Blob(_) | Value::Reference(_) | Value::References(_) | Value::StringArray(_) => None,
    }
}
