//! Extended JSON normalization
//!
//! Rewrites typed wrapper objects found in exported fixtures into native
//! values:
//!
//! | Wrapper                              | Native value        |
//! |--------------------------------------|---------------------|
//! | `{"$oid": "<24 hex>"}`               | [`Value::ObjectId`] |
//! | `{"$numberInt": "42"}`               | `Int` (`Double` if not integral) |
//! | `{"$numberLong": "..."}`             | `Int` (`Double` if not integral) |
//! | `{"$numberDouble": "..."}`           | always [`Value::Double`] |
//! | `{"$date": "..." \| ms \| {"$numberLong": ...}}` | [`Value::DateTime`] |
//!
//! Every wrapper except `$date` must be the only key of its object. A `$date`
//! key is honored even with sibling keys, and the siblings are discarded.
//!
//! A `$date` payload is judged as written, before anything inside it is
//! normalized: only a string, a plain number or a document carrying
//! `$numberLong` is a timestamp. Dates keep millisecond precision.
//!
//! A wrapper whose payload does not parse is left as an ordinary object, so
//! [`normalize`] never fails. A rejected `$date` payload is kept verbatim.

use crate::object_id::ObjectId;
use crate::time;
use crate::value::{Document, Value};
use chrono::{DateTime, Utc};

pub const OID_KEY: &str = "$oid";
pub const NUMBER_INT_KEY: &str = "$numberInt";
pub const NUMBER_LONG_KEY: &str = "$numberLong";
pub const NUMBER_DOUBLE_KEY: &str = "$numberDouble";
pub const DATE_KEY: &str = "$date";

/// A recognized typed wrapper
#[derive(Debug, Clone, PartialEq)]
pub enum Wrapper {
    ObjectId(ObjectId),
    Number(Value),
    Date(DateTime<Utc>),
}

impl Wrapper {
    /// Try to read `doc` as a wrapper; `None` means it is an ordinary object
    pub fn parse(doc: &Document) -> Option<Self> {
        if let Some((key, payload)) = doc.single_entry() {
            match key {
                OID_KEY => {
                    return payload
                        .as_str()
                        .and_then(|hex| ObjectId::parse_str(hex).ok())
                        .map(Wrapper::ObjectId);
                }
                NUMBER_INT_KEY | NUMBER_LONG_KEY => {
                    return parse_number(payload).map(Wrapper::Number);
                }
                NUMBER_DOUBLE_KEY => {
                    return parse_double(payload).map(Wrapper::Number);
                }
                _ => {}
            }
        }

        doc.get(DATE_KEY).and_then(parse_date).map(Wrapper::Date)
    }

    pub fn into_value(self) -> Value {
        match self {
            Wrapper::ObjectId(oid) => Value::ObjectId(oid),
            Wrapper::Number(n) => n,
            Wrapper::Date(dt) => Value::DateTime(dt),
        }
    }
}

/// Normalize a value tree, replacing every wrapper with its native value
///
/// Children are normalized before their parent is inspected, so the result is
/// a fixed point: `normalize(normalize(v)) == normalize(v)`. A `$date` payload
/// is read as written and never rewritten.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        Value::Document(doc) => {
            if let Some(date) = doc.get(DATE_KEY).and_then(parse_date) {
                return Value::DateTime(date);
            }
            let doc: Document = doc
                .into_iter()
                .map(|(k, v)| if k == DATE_KEY { (k, v) } else { (k, normalize(v)) })
                .collect();
            match Wrapper::parse(&doc) {
                Some(wrapper) => wrapper.into_value(),
                None => Value::Document(doc),
            }
        }
        scalar => scalar,
    }
}

/// Convert parsed JSON and normalize it in one step
pub fn normalize_json(json: serde_json::Value) -> Value {
    normalize(Value::from(json))
}

fn parse_number(payload: &Value) -> Option<Value> {
    match payload {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                Some(Value::Int(i))
            } else {
                s.parse::<f64>().ok().map(Value::Double)
            }
        }
        Value::Int(i) => Some(Value::Int(*i)),
        Value::Double(f) => Some(Value::Double(*f)),
        _ => None,
    }
}

fn parse_double(payload: &Value) -> Option<Value> {
    match payload {
        Value::String(s) => s.trim().parse::<f64>().ok().map(Value::Double),
        Value::Int(i) => Some(Value::Double(*i as f64)),
        Value::Double(f) => Some(Value::Double(*f)),
        _ => None,
    }
}

fn parse_date(payload: &Value) -> Option<DateTime<Utc>> {
    match payload {
        Value::String(s) => time::parse_date_string(s),
        Value::Int(millis) => time::from_epoch_millis(*millis),
        Value::Double(millis) if millis.is_finite() => time::from_epoch_millis(millis.trunc() as i64),
        // `{"$numberLong": ...}` nested beside other keys is not a wrapper by itself
        Value::Document(inner) => match inner.get(NUMBER_LONG_KEY).and_then(parse_number)? {
            Value::Int(millis) => time::from_epoch_millis(millis),
            Value::Double(millis) if millis.is_finite() => {
                time::from_epoch_millis(millis.trunc() as i64)
            }
            _ => None,
        },
        _ => None,
    }
}
