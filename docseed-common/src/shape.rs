//! Fixture shape resolution
//!
//! Fixture files arrive as a bare array, an object wrapping the array under
//! one of several plausible keys, or a single document. Resolution walks an
//! ordered list of [`ShapeStrategy`] values and stops at the first match.

use serde_json::Value as JsonValue;

/// Generic wrapper key tried after the caller's candidate keys
pub const FALLBACK_KEY: &str = "data";

/// Outcome of shape resolution
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// A list of raw documents
    Sequence(Vec<JsonValue>),
    /// One object to be treated as a single document
    SingleDocument(JsonValue),
    /// Nothing usable
    Empty,
}

impl Shape {
    pub fn into_vec(self) -> Vec<JsonValue> {
        match self {
            Shape::Sequence(items) => items,
            Shape::SingleDocument(doc) => vec![doc],
            Shape::Empty => Vec::new(),
        }
    }
}

/// One way of finding the document list inside a fixture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeStrategy {
    /// The fixture itself is an array
    BareArray,
    /// An object holding an array under this key
    WrappedUnder(String),
    /// Any other object is one document
    SingleObject,
}

impl ShapeStrategy {
    /// Strategy list for the given candidate keys, in priority order
    pub fn chain<S: AsRef<str>>(candidate_keys: &[S]) -> Vec<ShapeStrategy> {
        let mut chain = Vec::with_capacity(candidate_keys.len() + 3);
        chain.push(ShapeStrategy::BareArray);
        chain.extend(
            candidate_keys
                .iter()
                .map(|k| ShapeStrategy::WrappedUnder(k.as_ref().to_string())),
        );
        chain.push(ShapeStrategy::WrappedUnder(FALLBACK_KEY.to_string()));
        chain.push(ShapeStrategy::SingleObject);
        chain
    }

    fn apply(&self, json: &mut JsonValue) -> Option<Shape> {
        match (self, json) {
            (ShapeStrategy::BareArray, JsonValue::Array(items)) => {
                Some(Shape::Sequence(std::mem::take(items)))
            }
            (ShapeStrategy::WrappedUnder(key), JsonValue::Object(map)) => match map.get_mut(key) {
                Some(JsonValue::Array(items)) => Some(Shape::Sequence(std::mem::take(items))),
                _ => None,
            },
            (ShapeStrategy::SingleObject, json) if json.is_object() => {
                Some(Shape::SingleDocument(json.take()))
            }
            _ => None,
        }
    }
}

/// Resolve the shape of a parsed fixture
pub fn resolve_shape<S: AsRef<str>>(mut json: JsonValue, candidate_keys: &[S]) -> Shape {
    ShapeStrategy::chain(candidate_keys)
        .iter()
        .find_map(|strategy| strategy.apply(&mut json))
        .unwrap_or(Shape::Empty)
}

/// Extract the document list from a parsed fixture; never fails
pub fn ensure_array<S: AsRef<str>>(json: JsonValue, candidate_keys: &[S]) -> Vec<JsonValue> {
    resolve_shape(json, candidate_keys).into_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const USER_KEYS: [&str; 2] = ["users", "user"];

    #[test]
    fn test_wrapped_under_candidate_key() {
        let out = ensure_array(json!({ "users": [{ "a": 1 }, { "b": 2 }] }), &USER_KEYS);
        assert_eq!(out, vec![json!({ "a": 1 }), json!({ "b": 2 })]);
    }

    #[test]
    fn test_bare_array_unchanged() {
        let out = ensure_array(json!([{ "a": 1 }, 2]), &USER_KEYS);
        assert_eq!(out, vec![json!({ "a": 1 }), json!(2)]);
    }

    #[test]
    fn test_fallback_data_key() {
        let out = ensure_array(json!({ "data": [{ "a": 1 }] }), &USER_KEYS);
        assert_eq!(out, vec![json!({ "a": 1 })]);
    }

    #[test]
    fn test_single_object_wrapped() {
        let out = ensure_array(json!({ "foo": 1 }), &USER_KEYS);
        assert_eq!(out, vec![json!({ "foo": 1 })]);
    }

    #[test]
    fn test_scalar_yields_empty() {
        assert!(ensure_array(json!(42), &USER_KEYS).is_empty());
        assert!(ensure_array(json!("users"), &USER_KEYS).is_empty());
        assert!(ensure_array(json!(null), &USER_KEYS).is_empty());
        assert_eq!(resolve_shape(json!(true), &USER_KEYS), Shape::Empty);
    }

    #[test]
    fn test_candidate_priority_order() {
        let fixture = json!({ "user": [1], "users": [2], "data": [3] });
        assert_eq!(ensure_array(fixture.clone(), &USER_KEYS), vec![json!(2)]);
        assert_eq!(ensure_array(fixture, &["user", "users"]), vec![json!(1)]);
    }

    #[test]
    fn test_candidate_must_hold_array() {
        // "users" is an object here, so the fallback key wins
        let fixture = json!({ "users": { "a": 1 }, "data": [{ "b": 2 }] });
        assert_eq!(ensure_array(fixture, &USER_KEYS), vec![json!({ "b": 2 })]);
    }

    #[test]
    fn test_object_without_arrays_is_single_document() {
        let fixture = json!({ "users": "none", "data": 5 });
        assert_eq!(
            resolve_shape(fixture.clone(), &USER_KEYS),
            Shape::SingleDocument(fixture)
        );
    }

    #[test]
    fn test_empty_wrapped_array_is_an_empty_sequence() {
        assert_eq!(
            resolve_shape(json!({ "users": [] }), &USER_KEYS),
            Shape::Sequence(vec![])
        );
    }

    #[test]
    fn test_strategy_chain_layout() {
        let chain = ShapeStrategy::chain(&["hotels"]);
        assert_eq!(
            chain,
            vec![
                ShapeStrategy::BareArray,
                ShapeStrategy::WrappedUnder("hotels".to_string()),
                ShapeStrategy::WrappedUnder("data".to_string()),
                ShapeStrategy::SingleObject,
            ]
        );
    }
}
