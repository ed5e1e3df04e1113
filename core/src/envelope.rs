//! Batch envelope codec.
//!
//! # Design
//! Requests wrap projected payloads as `{"add": [...]}` or
//! `{"update": [...]}`. Responses wrap items in
//! `{"_links": ..., "_embedded": {"items": [...], "errors": {...}}}`.
//!
//! A mutation can be accepted at the HTTP level yet rejected per identifier
//! inside `_embedded.errors`. Decoding a mutation therefore yields a tagged
//! [`MutationOutcome`] so a partial failure cannot be mistaken for success.
//! List responses never legitimately carry errors; if one does, it is logged
//! and ignored.

use std::collections::BTreeMap;

use serde::de::{self, DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::projection::{Mutation, Projection};

/// Failure reasons keyed by operation, then by identifier.
pub type ErrorMap = BTreeMap<String, BTreeMap<String, String>>;

/// A decoded response envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope<T> {
    pub items: Vec<T>,
    pub errors: ErrorMap,
}

/// What the server echoes back for each mutated record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutatedItem {
    pub id: u64,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

/// The decoded result of a batch mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// Every submitted record was applied.
    Applied { items: Vec<MutatedItem> },
    /// At least one record was rejected; `failures` maps identifier to reason.
    PartiallyFailed {
        items: Vec<MutatedItem>,
        failures: BTreeMap<String, String>,
    },
}

impl MutationOutcome {
    pub fn items(&self) -> &[MutatedItem] {
        match self {
            MutationOutcome::Applied { items } => items,
            MutationOutcome::PartiallyFailed { items, .. } => items,
        }
    }

    /// The server's reason for rejecting `id`, if it did.
    pub fn failure_for(&self, id: &str) -> Option<&str> {
        match self {
            MutationOutcome::Applied { .. } => None,
            MutationOutcome::PartiallyFailed { failures, .. } => {
                failures.get(id).map(String::as_str)
            }
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, MutationOutcome::Applied { .. })
    }
}

#[derive(Deserialize)]
struct WireEnvelope<T> {
    #[serde(rename = "_embedded")]
    embedded: Option<WireEmbedded<T>>,
}

#[derive(Deserialize)]
struct WireEmbedded<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default, deserialize_with = "lenient_errors")]
    errors: ErrorMap,
}

/// The server serializes "no errors" as an empty array rather than `{}`,
/// both for the whole map and for a single operation.
fn lenient_errors<'de, D>(deserializer: D) -> Result<ErrorMap, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum WireErrors {
        Keyed(BTreeMap<String, WireFailures>),
        Empty(Vec<IgnoredAny>),
        Null(()),
    }

    match WireErrors::deserialize(deserializer)? {
        WireErrors::Keyed(operations) => {
            let mut errors = ErrorMap::new();
            for (operation, failures) in operations {
                let failures = failures.into_map::<D::Error>()?;
                if !failures.is_empty() {
                    errors.insert(operation, failures);
                }
            }
            Ok(errors)
        }
        WireErrors::Empty(entries) => empty_array(entries.len()).map(|()| ErrorMap::new()),
        WireErrors::Null(()) => Ok(ErrorMap::new()),
    }
}

/// Failure reasons for one operation, keyed by identifier.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireFailures {
    Keyed(BTreeMap<String, String>),
    Empty(Vec<IgnoredAny>),
}

impl WireFailures {
    fn into_map<E: de::Error>(self) -> Result<BTreeMap<String, String>, E> {
        match self {
            WireFailures::Keyed(failures) => Ok(failures),
            WireFailures::Empty(entries) => empty_array(entries.len()).map(|()| BTreeMap::new()),
        }
    }
}

fn empty_array<E: de::Error>(len: usize) -> Result<(), E> {
    if len == 0 {
        return Ok(());
    }
    Err(E::custom(format!(
        "expected errors keyed by identifier, got an array of {len}"
    )))
}

/// Wrap payloads in the `{"<op>": [...]}` envelope.
pub fn encode_batch(mutation: Mutation, payloads: &[Projection]) -> Result<Vec<u8>, ApiError> {
    let batch: Vec<Value> = payloads.iter().cloned().map(Projection::into_value).collect();
    let mut envelope = Map::new();
    envelope.insert(mutation.as_str().to_string(), Value::Array(batch));
    serde_json::to_vec(&Value::Object(envelope))
        .map_err(|e| ApiError::SerializationError(e.to_string()))
}

/// Decode any response envelope. An empty body is an envelope with no items;
/// the server answers an exhausted list with `204 No Content`.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<ResponseEnvelope<T>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ResponseEnvelope {
            items: Vec::new(),
            errors: ErrorMap::new(),
        });
    }
    let wire: WireEnvelope<T> = serde_json::from_slice(body)?;
    Ok(match wire.embedded {
        Some(embedded) => ResponseEnvelope {
            items: embedded.items,
            errors: embedded.errors,
        },
        None => ResponseEnvelope {
            items: Vec::new(),
            errors: ErrorMap::new(),
        },
    })
}

/// Decode one page of a list response.
pub fn decode_page<T: DeserializeOwned>(body: &[u8]) -> Result<Vec<T>, ApiError> {
    let envelope = decode::<T>(body)?;
    if !envelope.errors.is_empty() {
        log::warn!("ignoring errors on a list response: {:?}", envelope.errors);
    }
    Ok(envelope.items)
}

/// Decode a batch mutation response for `mutation`.
pub fn decode_mutation(body: &[u8], mutation: Mutation) -> Result<MutationOutcome, ApiError> {
    let mut envelope = decode::<MutatedItem>(body)?;
    let failures = envelope
        .errors
        .remove(mutation.as_str())
        .unwrap_or_default();
    if !envelope.errors.is_empty() {
        log::warn!(
            "{mutation} response carries errors for other operations: {:?}",
            envelope.errors
        );
    }
    if failures.is_empty() {
        return Ok(MutationOutcome::Applied {
            items: envelope.items,
        });
    }
    Ok(MutationOutcome::PartiallyFailed {
        items: envelope.items,
        failures,
    })
}
