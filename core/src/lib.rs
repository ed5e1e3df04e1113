//! Synchronous client core for the amoCRM v2 resource API.
//!
//! # Overview
//! Contacts, leads, companies and notes are exposed through one generic
//! façade with the same operations for every kind: list everything, list by
//! responsible user, list by free-text query, fetch by id, add and update.
//!
//! # Design
//! - The network sits behind the [`Transport`] trait; the core only decides
//!   what to send and how to read the answer.
//! - List endpoints return at most 500 rows per page with no total, so the
//!   fetcher walks pages until a short one arrives.
//! - Mutations are batch envelopes (`{"add": [...]}` / `{"update": [...]}`).
//!   Only the fields a kind's projection rules select are sent.
//! - A mutation can fail per identifier inside a 2xx response; that surfaces
//!   as [`ApiError::PartialMutation`], never as success.
//!
//! ```no_run
//! use amocrm_core::{AmoCrm, CrmConfig};
//!
//! # fn main() -> Result<(), amocrm_core::ApiError> {
//! let crm = AmoCrm::from_config(&CrmConfig::from_env()?)?;
//! let mut contact = crm.contacts().create();
//! contact.name = "Ivan".to_string();
//! let id = crm.contacts().add(&contact)?;
//! let mut stored = crm.contacts().id(id)?;
//! stored.name = "Ivan Petrov".to_string();
//! crm.contacts().update(&stored)?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod http;
pub mod pagination;
pub mod projection;
pub mod resources;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{AmoCrm, Resources};
pub use config::{CrmConfig, EnvSource};
pub use envelope::{MutatedItem, MutationOutcome, ResponseEnvelope};
pub use error::{ApiError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use pagination::PAGE_LIMIT;
pub use projection::{Mutation, Projection};
pub use resources::{
    Company, Contact, CustomField, ElementType, EntityRef, IdList, Lead, Note, NoteType, Resource,
    ResourceKind, Tag,
};
pub use transport::{Credentials, Transport, UreqTransport};
