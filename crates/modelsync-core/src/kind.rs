//! Model kinds
//!
//! A kind carries the per-entity-type behavior of a model: where it lives,
//! how a payload becomes attributes, and which attribute sets are acceptable.

use serde_json::Value;

use crate::attributes::Attributes;
use crate::error::ParseError;

/// Behavior shared by every model of one type
pub trait ModelKind: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Default remote location for fetch and save
    fn url(&self) -> &str;

    /// Turn a raw payload into attributes
    ///
    /// Must be pure and deterministic. Default is identity.
    fn parse(&self, payload: Value) -> Result<Attributes, ParseError> {
        Attributes::from_value(payload)
    }

    /// Turn attributes back into the payload shape `parse` reads
    ///
    /// Default is identity.
    fn to_payload(&self, attributes: &Attributes) -> Value {
        attributes.to_value()
    }

    /// Check a full candidate attribute set
    ///
    /// Returns a human-readable reason on failure. Default accepts everything.
    fn validate(&self, _candidate: &Attributes) -> Option<String> {
        None
    }
}

impl<K: ModelKind + ?Sized> ModelKind for Box<K> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn url(&self) -> &str {
        (**self).url()
    }

    fn parse(&self, payload: Value) -> Result<Attributes, ParseError> {
        (**self).parse(payload)
    }

    fn to_payload(&self, attributes: &Attributes) -> Value {
        (**self).to_payload(attributes)
    }

    fn validate(&self, candidate: &Attributes) -> Option<String> {
        (**self).validate(candidate)
    }
}

/// Plain kind: payload is taken as-is
#[derive(Debug, Clone)]
pub struct Resource {
    name: String,
    url: String,
}

impl Resource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

impl ModelKind for Resource {
    fn name(&self) -> &str {
        &self.name
    }

    fn url(&self) -> &str {
        &self.url
    }
}

/// Transforming kind: attributes live under one field of the payload
#[derive(Debug, Clone)]
pub struct Envelope {
    name: String,
    url: String,
    field: String,
}

impl Envelope {
    pub fn new(name: impl Into<String>, url: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            field: field.into(),
        }
    }
}

impl ModelKind for Envelope {
    fn name(&self) -> &str {
        &self.name
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn parse(&self, payload: Value) -> Result<Attributes, ParseError> {
        let Value::Object(mut envelope) = payload else {
            return Attributes::from_value(payload);
        };
        let inner = envelope
            .remove(&self.field)
            .ok_or_else(|| ParseError::MissingField {
                field: self.field.clone(),
            })?;
        Attributes::from_value(inner)
    }

    fn to_payload(&self, attributes: &Attributes) -> Value {
        let mut envelope = serde_json::Map::new();
        envelope.insert(self.field.clone(), attributes.to_value());
        Value::Object(envelope)
    }
}

/// Wraps a kind and rejects candidates where a required field is blank
///
/// A field is blank when it is missing, null, an empty or whitespace-only
/// string, or an empty array/object. Numbers and booleans are never blank.
#[derive(Debug, Clone)]
pub struct Required<K> {
    inner: K,
    fields: Vec<String>,
}

impl<K: ModelKind> Required<K> {
    pub fn new(inner: K, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            inner,
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl<K: ModelKind> ModelKind for Required<K> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn url(&self) -> &str {
        self.inner.url()
    }

    fn parse(&self, payload: Value) -> Result<Attributes, ParseError> {
        self.inner.parse(payload)
    }

    fn to_payload(&self, attributes: &Attributes) -> Value {
        self.inner.to_payload(attributes)
    }

    fn validate(&self, candidate: &Attributes) -> Option<String> {
        if let Some(field) = self.fields.iter().find(|f| is_blank(candidate.get(f))) {
            return Some(format!("{} cannot be blank", field));
        }
        self.inner.validate(candidate)
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        Some(_) => false,
    }
}
