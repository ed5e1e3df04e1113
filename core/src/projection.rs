//! Field projection for outbound mutations.
//!
//! # Design
//! The server reads a missing key as "leave unchanged", so a projection
//! decides per field whether the key is on the wire at all. Resource kinds
//! describe their rules with the small builder below: `always` for fields the
//! mode must restate, `when_set` for optional associations, and
//! `when_nonempty` for lists. A skipped field leaves no key behind, neither
//! `null` nor zero.

use serde_json::{Map, Value};

/// The two batch mutations the API supports. Doubles as the envelope key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutation {
    Add,
    Update,
}

impl Mutation {
    pub fn as_str(self) -> &'static str {
        match self {
            Mutation::Add => "add",
            Mutation::Update => "update",
        }
    }
}

impl std::fmt::Display for Mutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The projected fields of one resource, ready for the batch envelope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    fields: Map<String, Value>,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `key` unconditionally.
    pub fn always(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Emit `key` only when the value is set.
    pub fn when_set<V: Into<Value>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.always(key, value),
            None => self,
        }
    }

    /// Emit `key` as an array only when there is at least one element.
    pub fn when_nonempty<V: Into<Value>>(self, key: &str, values: Vec<V>) -> Self {
        if values.is_empty() {
            return self;
        }
        self.always(key, values)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}
