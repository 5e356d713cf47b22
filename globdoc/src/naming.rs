//! Store-side attribute names for fields.

use crate::types::FieldDescriptor;

/// Reserved attribute holding a document's identity.
pub const IDENTITY_FIELD_NAME: &str = "_id";
/// Attribute carrying the referenced collection in a database reference.
pub const REFERENCE_COLLECTION_EXT: &str = "ref";
/// Attribute carrying the referenced document id in a database reference.
pub const REFERENCE_ID_EXT: &str = "id";

/// Resolve the attribute name used for `field` in the store.
///
/// Precedence: an explicit store-name override wins; otherwise a key field flagged as the
/// store identity maps to [`IDENTITY_FIELD_NAME`]; otherwise the field keeps its own name.
pub fn store_name(field: &FieldDescriptor) -> &str {
    if let Some(name) = field.store_name.as_deref() {
        return name;
    }
    if field.key && field.identity {
        return IDENTITY_FIELD_NAME;
    }
    &field.name
}
