//! Data model shared by both backends.
//!
//! These models are storage-agnostic: a relational row and a document are
//! both flat maps from column/property name to a [`Scalar`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Values
// =============================================================================

/// A single scalar value. Nested objects and arrays are not supported.
///
/// Serialized untagged, so a field map reads and writes as a flat JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Convert a JSON value read back from a store.
    ///
    /// Nested values have no scalar form and are kept as their JSON text.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Scalar::Null,
            serde_json::Value::Bool(b) => Scalar::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Scalar::Integer(i),
                None => Scalar::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Scalar::Text(s),
            nested => Scalar::Text(nested.to_string()),
        }
    }
}

/// String form of a value, as a loosely-typed caller would see it.
impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

/// Mapping from column/property name to value. Used as create/update payload
/// and, under the name "criteria", as a lookup predicate.
pub type FieldMap = BTreeMap<String, Scalar>;

/// A materialized row or document. Empty means "nothing created/matched".
pub type Record = FieldMap;

/// Build a [`FieldMap`] from `(name, value)` pairs.
pub fn field_map<K, V, I>(pairs: I) -> FieldMap
where
    K: Into<String>,
    V: Into<Scalar>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

// =============================================================================
// Requests
// =============================================================================

/// Create a record in `origin` (table or collection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub origin: String,
    pub fields: FieldMap,
}

/// Update the record in `origin` selected by `criteria` with `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub origin: String,
    pub fields: FieldMap,
    pub criteria: FieldMap,
}

/// Delete the record(s) in `origin` selected by `criteria`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub origin: String,
    pub criteria: FieldMap,
}

impl CreateRequest {
    pub fn new(origin: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            origin: origin.into(),
            fields,
        }
    }
}

impl UpdateRequest {
    pub fn new(origin: impl Into<String>, fields: FieldMap, criteria: FieldMap) -> Self {
        Self {
            origin: origin.into(),
            fields,
            criteria,
        }
    }
}

impl DeleteRequest {
    pub fn new(origin: impl Into<String>, criteria: FieldMap) -> Self {
        Self {
            origin: origin.into(),
            criteria,
        }
    }
}

// =============================================================================
// Schema
// =============================================================================

/// Role a column plays in the table's key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyRole {
    Primary,
    None,
}

/// Column metadata as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub declared_type: String,
    pub key_role: KeyRole,
    /// Value is produced by the engine (auto-increment / rowid alias).
    pub generated: bool,
}

impl ColumnDescriptor {
    pub fn is_primary(&self) -> bool {
        self.key_role == KeyRole::Primary
    }
}

/// A table's key column plus the key/value fragment of the row last targeted.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryKeyInfo {
    pub table: String,
    pub column: ColumnDescriptor,
    /// `{key_column: coded_value}`; `None` when the candidate had no key value.
    pub last_insert: Option<FieldMap>,
}

impl PrimaryKeyInfo {
    pub fn key_name(&self) -> &str {
        &self.column.name
    }
}
