//! Attribute mapping
//!
//! A model's locally visible state: string keys mapped to JSON values.
//! Always backed by a JSON object, so it round-trips through the transport
//! unchanged and can be converted to a typed record when the schema is fixed.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ParseError;

/// Name of the attribute holding the server-side identifier
pub const ID_ATTRIBUTE: &str = "id";

/// String-keyed attribute mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(Map<String, Value>);

impl Attributes {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON value, which must be an object
    pub fn from_value(value: Value) -> Result<Self, ParseError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ParseError::NotAnObject {
                found: type_name(&other),
            }),
        }
    }

    /// Build from a typed record
    pub fn from_record<T: Serialize>(record: &T) -> Result<Self, ParseError> {
        Self::from_value(serde_json::to_value(record)?)
    }

    /// Convert into a typed record
    pub fn to_record<T: DeserializeOwned>(&self) -> Result<T, ParseError> {
        Ok(serde_json::from_value(Value::Object(self.0.clone()))?)
    }

    /// Get an attribute
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a string attribute
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Check whether an attribute is present and not null
    pub fn has(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(|v| !v.is_null())
    }

    /// Set an attribute, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove an attribute
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Merge `other` into this mapping
    ///
    /// Returns the keys whose value actually changed, in `other`'s order.
    pub fn merge(&mut self, other: &Attributes) -> Vec<String> {
        let mut changed = Vec::new();
        for (key, value) in other.iter() {
            if self.0.get(key) != Some(value) {
                changed.push(key.clone());
            }
            self.0.insert(key.clone(), value.clone());
        }
        changed
    }

    /// Keys that differ between the two mappings
    pub fn diff_keys(&self, other: &Attributes) -> Vec<String> {
        let mut keys: Vec<String> = other
            .iter()
            .filter(|(k, v)| self.0.get(*k) != Some(*v))
            .map(|(k, _)| k.clone())
            .collect();
        for key in self.0.keys() {
            if !other.0.contains_key(key) {
                keys.push(key.clone());
            }
        }
        keys
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON object representation
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for Attributes {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl TryFrom<Value> for Attributes {
    type Error = ParseError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
