//! # Entities and hydration
//!
//! Every entity is decoded through a single routine, [`Entity::decode`], that
//! reads named fields from a [`FieldSource`]. Three sources exist:
//!
//! - a SQLite row of the local cache (`rusqlite::Row`)
//! - a JSON object returned by the remote store (`serde_json::Value`)
//! - an untyped [`FieldMap`], used for pending writes and decoded payloads
//!
//! JSON coming from the remote store may encode integers as numeric strings;
//! the JSON source accepts both.
//!
//! Decoding failures are reported as [`HydrationError`]. [`Entity::hydrate`]
//! turns them into a logged error and an empty entity (identity `0`), which
//! callers test with [`Entity::is_empty`].

mod named;
mod profile;
mod review;
mod user;

use std::{collections::BTreeMap, fmt};

use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue};
use serde_json::{Map, Value};

pub use named::{Author, City, Country, NamedEntity};
pub use profile::Profile;
pub use review::{Review, ReviewKey};
pub use user::{PrivateUser, PublicUser};

use crate::{error::HydrationError, schema::TableSchema};

/// A single untyped value of a [`FieldMap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Null,
    Int(i64),
    Text(String),
}

impl FieldValue {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Int(i64::from(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => FieldValue::Text(n.to_string()),
            },
            Value::String(s) => FieldValue::Text(s.clone()),
            other => FieldValue::Text(other.to_string()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Int(i) => Value::from(*i),
            FieldValue::Text(s) => Value::from(s.as_str()),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Null => None,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Int(i) => Some(i.to_string()),
            FieldValue::Text(s) => Some(s.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Int(i) => write!(f, "{i}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            FieldValue::Null => ToSqlOutput::Owned(SqlValue::Null),
            FieldValue::Int(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            FieldValue::Text(s) => ToSqlOutput::Borrowed(s.as_str().into()),
        })
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(i64::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Int(i64::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::Text)
    }
}

/// Untyped field set keyed by canonical column name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap(BTreeMap<String, FieldValue>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<FieldValue>) -> &mut Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.0.remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keeps only the entries accepted by `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.0.retain(|k, _| keep(k));
    }

    /// Reads the identity of `schema` from the map.
    pub fn id(&self, schema: &TableSchema) -> Option<i64> {
        self.get(schema.id).and_then(FieldValue::as_i64)
    }

    /// The identity fields of `schema`, when every one of them is set.
    pub fn key(&self, schema: &TableSchema) -> Option<FieldMap> {
        schema
            .key
            .iter()
            .map(|field| match self.get(field) {
                Some(value) if !value.is_null() => Some((field.to_string(), value.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn from_json(value: &Value) -> Result<Self, HydrationError> {
        let object = value.as_object().ok_or(HydrationError::NotAnObject)?;
        Ok(object
            .iter()
            .map(|(k, v)| (k.clone(), FieldValue::from_json(v)))
            .collect())
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect::<Map<_, _>>(),
        )
    }
}

impl FromIterator<(String, FieldValue)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a FieldMap {
    type Item = (&'a String, &'a FieldValue);
    type IntoIter = std::collections::btree_map::Iter<'a, String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Anything entity fields can be read from by name.
///
/// Optional readers treat a missing field like a `NULL` one, so partial
/// sources hydrate as long as every required field is present.
pub trait FieldSource {
    fn int(&self, field: &str) -> Result<i64, HydrationError>;

    fn opt_int(&self, field: &str) -> Result<Option<i64>, HydrationError>;

    fn opt_text(&self, field: &str) -> Result<Option<String>, HydrationError>;

    fn text(&self, field: &str) -> Result<String, HydrationError> {
        self.opt_text(field)?
            .ok_or_else(|| HydrationError::Missing(field.to_string()))
    }
}

impl FieldSource for rusqlite::Row<'_> {
    fn int(&self, field: &str) -> Result<i64, HydrationError> {
        self.opt_int(field)?
            .ok_or_else(|| HydrationError::Missing(field.to_string()))
    }

    fn opt_int(&self, field: &str) -> Result<Option<i64>, HydrationError> {
        match self.get::<_, Option<i64>>(field) {
            Ok(v) => Ok(v),
            Err(rusqlite::Error::InvalidColumnName(_)) => Ok(None),
            Err(rusqlite::Error::InvalidColumnType(..)) => Err(HydrationError::Mistyped {
                field: field.to_string(),
                expected: "an integer",
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn opt_text(&self, field: &str) -> Result<Option<String>, HydrationError> {
        match self.get_ref(field) {
            Ok(value) => Ok(match value {
                rusqlite::types::ValueRef::Null => None,
                rusqlite::types::ValueRef::Integer(i) => Some(i.to_string()),
                rusqlite::types::ValueRef::Real(r) => Some(r.to_string()),
                rusqlite::types::ValueRef::Text(t) | rusqlite::types::ValueRef::Blob(t) => {
                    Some(String::from_utf8_lossy(t).into_owned())
                }
            }),
            Err(rusqlite::Error::InvalidColumnName(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl FieldSource for Map<String, Value> {
    fn int(&self, field: &str) -> Result<i64, HydrationError> {
        self.opt_int(field)?
            .ok_or_else(|| HydrationError::Missing(field.to_string()))
    }

    fn opt_int(&self, field: &str) -> Result<Option<i64>, HydrationError> {
        match self.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => FieldValue::from_json(value)
                .as_i64()
                .map(Some)
                .ok_or_else(|| HydrationError::Mistyped {
                    field: field.to_string(),
                    expected: "an integer",
                }),
        }
    }

    fn opt_text(&self, field: &str) -> Result<Option<String>, HydrationError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::Array(_)) | Some(Value::Object(_)) => Err(HydrationError::Mistyped {
                field: field.to_string(),
                expected: "a scalar",
            }),
            Some(value) => Ok(FieldValue::from_json(value).as_text()),
        }
    }
}

impl FieldSource for Value {
    fn int(&self, field: &str) -> Result<i64, HydrationError> {
        self.as_object()
            .ok_or(HydrationError::NotAnObject)?
            .int(field)
    }

    fn opt_int(&self, field: &str) -> Result<Option<i64>, HydrationError> {
        self.as_object()
            .ok_or(HydrationError::NotAnObject)?
            .opt_int(field)
    }

    fn opt_text(&self, field: &str) -> Result<Option<String>, HydrationError> {
        self.as_object()
            .ok_or(HydrationError::NotAnObject)?
            .opt_text(field)
    }
}

impl FieldSource for FieldMap {
    fn int(&self, field: &str) -> Result<i64, HydrationError> {
        self.opt_int(field)?
            .ok_or_else(|| HydrationError::Missing(field.to_string()))
    }

    fn opt_int(&self, field: &str) -> Result<Option<i64>, HydrationError> {
        match self.get(field) {
            None | Some(FieldValue::Null) => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| HydrationError::Mistyped {
                    field: field.to_string(),
                    expected: "an integer",
                }),
        }
    }

    fn opt_text(&self, field: &str) -> Result<Option<String>, HydrationError> {
        Ok(self.get(field).and_then(FieldValue::as_text))
    }
}

/// A typed record with a stable identity mapped between both stores.
pub trait Entity: Clone + Default + fmt::Debug + Send + 'static {
    const SCHEMA: &'static TableSchema;

    fn id(&self) -> i64;

    fn set_id(&mut self, id: i64);

    /// Builds the entity from named fields.
    fn decode<S: FieldSource + ?Sized>(source: &S) -> Result<Self, HydrationError>;

    /// Fields written to either store. The identity is left out while unset.
    fn to_fields(&self) -> FieldMap;

    fn is_empty(&self) -> bool {
        self.id() == 0
    }

    /// Like [`Entity::decode`] but logs failures and yields an empty entity.
    fn hydrate<S: FieldSource + ?Sized>(source: &S) -> Self {
        match Self::decode(source) {
            Ok(entity) => entity,
            Err(e) => {
                tracing::error!(table = Self::SCHEMA.table, error = %e, "hydration failed");
                Self::default()
            }
        }
    }
}
