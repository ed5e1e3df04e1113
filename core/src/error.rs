//! Error types for the CRM resource client.
//!
//! # Design
//! Transport failures are kept in their own enum because they come from the
//! collaborator that performs the I/O, not from this crate. `ApiError` wraps
//! them alongside the protocol-level failures: a body that does not decode,
//! an empty single-item lookup, and a mutation the server accepted at the
//! HTTP level but rejected per identifier inside the envelope.

use thiserror::Error;

/// Failures reported by a [`Transport`](crate::transport::Transport).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection, DNS or TLS failure before a response arrived.
    #[error("network error: {0}")]
    Network(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    TimedOut,

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Errors returned by resource operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The transport failed; aborts the operation, including mid-pagination.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body did not match the envelope shape.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The mutation payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// A single-item lookup decoded zero items.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: u64 },

    /// The server reported a per-identifier failure inside a success envelope.
    #[error("can't {operation} {kind} {id}, reason: {reason}")]
    PartialMutation {
        operation: &'static str,
        kind: &'static str,
        id: String,
        reason: String,
    },

    /// An update was requested for a resource that was never persisted.
    #[error("{kind} has no id, it must be added before it can be updated")]
    MissingId { kind: &'static str },

    /// A base URL or endpoint could not be parsed.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Required configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::DeserializationError(err.to_string())
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::InvalidUrl(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_mutation_names_identifier_and_reason() {
        let err = ApiError::PartialMutation {
            operation: "update",
            kind: "contact",
            id: "42".to_string(),
            reason: "Last modified date is older than in database".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "can't update contact 42, reason: Last modified date is older than in database"
        );
    }

    #[test]
    fn transport_error_is_transparent() {
        let err = ApiError::from(TransportError::Status {
            status: 401,
            body: "unauthorized".to_string(),
        });
        assert_eq!(err.to_string(), "HTTP 401: unauthorized");
        assert!(matches!(err, ApiError::Transport(TransportError::Status { status: 401, .. })));
    }

    #[test]
    fn not_found_mentions_kind() {
        let err = ApiError::NotFound { kind: "lead", id: 7 };
        assert_eq!(err.to_string(), "lead 7 not found");
    }
}
