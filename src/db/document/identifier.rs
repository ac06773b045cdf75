//! `_id` handling for the document store.
//!
//! Callers address documents by a plain `_id` property; the store keys them
//! by record id (`collection:key`). Only `_id` is coerced. Every other
//! property passes through untouched.

use crate::db::{CrudError, CrudResult, FieldMap, Scalar};

/// Property under which a document's key is exposed.
pub const ID_FIELD: &str = "_id";

/// Coerce a caller-supplied `_id` into a record key.
///
/// Accepts a non-empty string or an integer.
pub fn coerce_id(value: &Scalar) -> CrudResult<Scalar> {
    match value {
        Scalar::Text(key) if !key.trim().is_empty() => Ok(Scalar::Text(key.clone())),
        Scalar::Integer(key) => Ok(Scalar::Integer(*key)),
        other => Err(CrudError::InvalidIdentifier {
            value: other.to_string(),
            message: "expected a non-empty string or an integer".to_string(),
        }),
    }
}

/// Split `_id` off a field map. Returns the coerced key (if present) and the
/// remaining properties.
pub fn split_id(fields: &FieldMap) -> CrudResult<(Option<Scalar>, FieldMap)> {
    let mut content = fields.clone();
    let id = content.remove(ID_FIELD).map(|v| coerce_id(&v)).transpose()?;
    Ok((id, content))
}

/// Property names are spliced into queries as quoted identifiers, so reject
/// anything that could escape the quoting.
pub fn validate_field_name(name: &str) -> CrudResult<()> {
    if name.is_empty() {
        return Err(CrudError::invalid_request("empty property name"));
    }
    if name.contains('`') || name.chars().any(char::is_control) {
        return Err(CrudError::invalid_request(format!(
            "property name {:?} contains a backtick or control character",
            name
        )));
    }
    Ok(())
}
