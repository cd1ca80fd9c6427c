//! Native document values
//!
//! [`Value`] is the tree documents are normalized into before they reach the
//! store. Unlike `serde_json::Value` it can carry identifiers and timestamps
//! as first-class variants. [`Document`] keeps keys in fixture order.

use crate::object_id::ObjectId;
use crate::time;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Number};

/// Reserved primary key field of a stored document
pub const ID_FIELD: &str = "_id";

/// A document value in native form
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    ObjectId(ObjectId),
    DateTime(DateTime<Utc>),
    Array(Vec<Value>),
    Document(Document),
}

impl Value {
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Human-readable type name, used in store validation messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::ObjectId(_) => "objectId",
            Value::DateTime(_) => "date",
            Value::Array(_) => "array",
            Value::Document(_) => "document",
        }
    }

    /// Render as relaxed extended JSON
    ///
    /// Identifiers become `{"$oid": ...}`, timestamps `{"$date": ...}` and
    /// non-finite doubles `{"$numberDouble": ...}`. Normalizing the output
    /// yields the original value again.
    pub fn to_extended_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::Double(f) => match Number::from_f64(*f) {
                Some(n) => serde_json::Value::Number(n),
                None => json!({ "$numberDouble": non_finite_label(*f) }),
            },
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::ObjectId(oid) => json!({ "$oid": oid.to_hex() }),
            Value::DateTime(dt) => json!({ "$date": time::to_rfc3339_millis(dt) }),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_extended_json).collect())
            }
            Value::Document(doc) => doc.to_extended_json(),
        }
    }
}

fn non_finite_label(f: f64) -> &'static str {
    if f.is_nan() {
        "NaN"
    } else if f.is_sign_positive() {
        "Infinity"
    } else {
        "-Infinity"
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                // u64 above i64::MAX or a float
                None => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Document(Document::from(map)),
        }
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Document(doc)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<ObjectId> for Value {
    fn from(oid: ObjectId) -> Self {
        Value::ObjectId(oid)
    }
}

/// Insertion-ordered map of field name to value
///
/// Fixture documents are small, so lookups are linear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    entries: Vec<(String, Value)>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace; a replaced key keeps its original position
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The single entry of a one-key document
    pub fn single_entry(&self) -> Option<(&str, &Value)> {
        match self.entries.as_slice() {
            [(k, v)] => Some((k.as_str(), v)),
            _ => None,
        }
    }

    pub fn to_extended_json(&self) -> serde_json::Value {
        let map: Map<String, serde_json::Value> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_extended_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl From<Map<String, serde_json::Value>> for Document {
    fn from(map: Map<String, serde_json::Value>) -> Self {
        map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut doc = Document::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
