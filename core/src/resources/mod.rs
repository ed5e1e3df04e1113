//! CRM resource kinds and the shared values they embed.
//!
//! # Design
//! Each kind is a plain struct plus a [`Resource`] impl carrying its endpoint
//! and projection rules. Everything else (pagination, envelopes, the façade)
//! is generic over the trait, so the kinds cannot drift apart behaviorally.
//!
//! Optional associations are `Option`s. The wire uses `0` for "unset"
//! identifiers, which decode to `None`; `Some` therefore always means the
//! value was set by the server or by the caller.

mod company;
mod contact;
mod lead;
mod note;

pub use company::Company;
pub use contact::Contact;
pub use lead::Lead;
pub use note::{ElementType, Note, NoteType};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::projection::{Mutation, Projection};

/// Per-kind configuration: where the kind lives and what to call it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceKind {
    /// Path segment under `/api/v2/`.
    pub path: &'static str,
    /// Singular name used in error messages.
    pub name: &'static str,
}

/// A resource kind the client can list, fetch, add and update.
pub trait Resource: DeserializeOwned + Default {
    const KIND: ResourceKind;

    /// The server-assigned identifier, `None` until persisted.
    fn id(&self) -> Option<u64>;

    /// Project the fields sent for `mutation`. `now` is the Unix timestamp
    /// restated as `updated_at` on updates.
    fn project(&self, mutation: Mutation, now: i64) -> Projection;
}

/// A tag attached to a resource. Only the id is sent on mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

/// A custom field value, passed through to the wire unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomField(pub Value);

impl CustomField {
    /// The field definition's id, when the value carries one.
    pub fn field_id(&self) -> Option<u64> {
        self.0.get("id").and_then(Value::as_u64)
    }
}

impl From<CustomField> for Value {
    fn from(field: CustomField) -> Self {
        field.0
    }
}

/// A reference to a linked entity, e.g. `"company": {"id": 1, "name": "Acme"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(default, deserialize_with = "zero_as_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: String,
}

/// A list of linked ids, e.g. `"leads": {"id": [1, 2]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdList {
    #[serde(default)]
    pub id: Vec<u64>,
}

pub(crate) fn zero_as_none<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.filter(|id| *id != 0))
}

/// Linked entities come back as `{}` or `[]` when absent.
pub(crate) fn lenient_ref<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(T::default()),
        Value::Array(items) if items.is_empty() => Ok(T::default()),
        other => serde_json::from_value(other).map_err(serde::de::Error::custom),
    }
}

pub(crate) fn tag_ids(tags: &[Tag]) -> Vec<u64> {
    tags.iter().map(|tag| tag.id).collect()
}

pub(crate) fn custom_field_values(fields: &[CustomField]) -> Vec<Value> {
    fields.iter().cloned().map(Value::from).collect()
}
