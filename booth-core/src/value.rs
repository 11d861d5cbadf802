// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dynamically typed values and the key/value bodies of documents.
use std::collections::BTreeMap;
use std::collections::btree_map::Iter;

use serde::{Deserialize, Serialize};

/// Key/value map used for nested objects.
pub type Map = BTreeMap<String, Value>;

/// Enum of possible data types which can be held in a document body.
///
/// Serializes "untagged", so a body reads and writes as plain JSON.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer value.
    Integer(i64),

    /// Floating point value.
    Float(f64),

    /// String value.
    String(String),

    /// Ordered list of values.
    Array(Vec<Value>),

    /// Nested key/value map.
    Object(Map),
}

impl Value {
    /// Return the type of this value as a string.
    pub fn field_type(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "str",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Returns false for `null` and `false`, true for every other value.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(value) => Value::Integer(value),
            Err(_) => Value::Float(value as f64),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Value::Object(value)
    }
}

impl From<Body> for Value {
    fn from(value: Body) -> Self {
        Value::Object(value.0)
    }
}

/// Top-level key/value structure of a document.
///
/// Keys are kept in sorted order, which keeps projections and listings deterministic.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Body(Map);

impl Body {
    /// Creates a new, empty body.
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Inserts a value, returning the one previously stored under that key.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.to_owned(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Returns a copy of this body without the given keys.
    pub fn without(&self, keys: &[&str]) -> Body {
        self.0
            .iter()
            .filter(|(key, _)| !keys.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl From<Map> for Body {
    fn from(map: Map) -> Self {
        Self(map)
    }
}

impl From<Body> for Map {
    fn from(body: Body) -> Self {
        body.0
    }
}

impl From<Vec<(&str, Value)>> for Body {
    fn from(fields: Vec<(&str, Value)>) -> Self {
        fields
            .into_iter()
            .map(|(key, value)| (key.to_owned(), value))
            .collect()
    }
}

impl FromIterator<(String, Value)> for Body {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Body {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{Body, Value};

    #[rstest]
    #[case(Value::Null, false)]
    #[case(Value::Bool(false), false)]
    #[case(Value::Bool(true), true)]
    #[case(Value::Integer(0), true)]
    #[case(Value::String(String::new()), true)]
    #[case(Value::Array(vec![]), true)]
    fn truthiness(#[case] value: Value, #[case] expected: bool) {
        assert_eq!(value.is_truthy(), expected);
    }

    #[test]
    fn body_from_json() {
        let body: Body = serde_json::from_str(
            r#"{"a": 1, "b": 2.5, "c": "text", "d": [true, null], "e": {"f": false}}"#,
        )
        .unwrap();

        assert_eq!(body.get("a"), Some(&Value::Integer(1)));
        assert_eq!(body.get("b"), Some(&Value::Float(2.5)));
        assert_eq!(body.get("c"), Some(&Value::from("text")));
        assert_eq!(
            body.get("d"),
            Some(&Value::Array(vec![Value::Bool(true), Value::Null]))
        );
        assert_eq!(body.get("e").unwrap().field_type(), "object");

        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(
            json,
            r#"{"a":1,"b":2.5,"c":"text","d":[true,null],"e":{"f":false}}"#
        );
    }

    #[test]
    fn without_keys() {
        let body = Body::from(vec![
            ("_id", Value::from("d1")),
            ("_rev", Value::from("r1")),
            ("a", Value::Integer(1)),
        ]);

        let stripped = body.without(&["_id", "_rev"]);
        assert_eq!(stripped, Body::from(vec![("a", Value::Integer(1))]));
        // Original is left untouched
        assert_eq!(body.len(), 3);
    }

    #[test]
    fn insert_remove_iter() {
        let mut body = Body::new();
        assert!(body.is_empty());

        assert_eq!(body.insert("b", Value::Null), None);
        assert_eq!(body.insert("a", 1i64), None);
        assert_eq!(body.insert("a", 2i64), Some(Value::Integer(1)));
        assert!(body.get("b").is_some_and(Value::is_null));
        assert!(!body.get("a").is_some_and(Value::is_null));

        // Keys come out ordered
        let entries: Vec<(&String, &Value)> = body.iter().collect();
        assert_eq!(
            entries,
            vec![
                (&"a".to_string(), &Value::Integer(2)),
                (&"b".to_string(), &Value::Null)
            ]
        );

        assert_eq!(body.remove("b"), Some(Value::Null));
        assert_eq!(body.remove("b"), None);
        assert!(!body.contains_key("b"));
        assert_eq!(body.len(), 1);
    }
}
