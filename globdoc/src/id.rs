//! Document ids for stores that address documents by key.

use nanoid::nanoid;

/// Separator between the parts of a compound key.
pub const KEY_SEPARATOR: &str = ":";

// No 0/O, 1/I/l, i/k/o.
const GENERATED_ALPHABET: [char; 46] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y',
    'Z', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'j', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];
const GENERATED_LEN: usize = 20;

/// Join key parts into a document id.
///
/// `None` when there are no parts or any part is missing; a partial key never names a
/// document.
pub fn compound_id<I>(parts: I) -> Option<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    let parts: Vec<String> = parts.into_iter().collect::<Option<_>>()?;
    (!parts.is_empty()).then(|| parts.join(KEY_SEPARATOR))
}

/// The document's key when complete, otherwise a freshly generated id.
pub fn document_id_or_generate(key: Option<String>) -> String {
    key.unwrap_or_else(generate_document_id)
}

pub fn generate_document_id() -> String {
    nanoid!(GENERATED_LEN, &GENERATED_ALPHABET)
}
