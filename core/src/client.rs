//! The public entry point and the per-kind resource façade.
//!
//! # Design
//! `AmoCrm` owns a transport and the account's base URL and carries no other
//! state between calls. `Resources<R, T>` binds one resource kind to the
//! generic fetcher and codec; every kind gets the same six operations with no
//! per-kind logic beyond its [`Resource`] impl. Each call is one logical
//! request/response cycle (pagination aside), so a façade can be created and
//! dropped freely.

use std::marker::PhantomData;

use url::Url;

use crate::config::CrmConfig;
use crate::endpoint::Endpoint;
use crate::envelope::{decode_mutation, encode_batch, MutationOutcome};
use crate::error::ApiError;
use crate::pagination::{fetch_all, fetch_one};
use crate::projection::Mutation;
use crate::resources::{Company, Contact, Lead, Note, Resource};
use crate::transport::{Transport, UreqTransport};

/// Client for one CRM account.
#[derive(Debug, Clone)]
pub struct AmoCrm<T> {
    transport: T,
    base_url: Url,
}

impl AmoCrm<UreqTransport> {
    /// Build a client that talks to the account described by `config`.
    pub fn from_config(config: &CrmConfig) -> Result<Self, ApiError> {
        let transport =
            UreqTransport::new(config.timeout).with_credentials(config.credentials.clone());
        Ok(Self {
            transport,
            base_url: config.base_url()?,
        })
    }
}

impl<T: Transport> AmoCrm<T> {
    pub fn new(base_url: &str, transport: T) -> Result<Self, ApiError> {
        Ok(Self {
            transport,
            base_url: Url::parse(base_url)?,
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn contacts(&self) -> Resources<'_, Contact, T> {
        self.resource()
    }

    pub fn leads(&self) -> Resources<'_, Lead, T> {
        self.resource()
    }

    pub fn companies(&self) -> Resources<'_, Company, T> {
        self.resource()
    }

    pub fn notes(&self) -> Resources<'_, Note, T> {
        self.resource()
    }

    /// The façade for any resource kind.
    pub fn resource<R: Resource>(&self) -> Resources<'_, R, T> {
        Resources {
            transport: &self.transport,
            base_url: &self.base_url,
            kind: PhantomData,
        }
    }
}

/// List, fetch, add and update one kind of resource.
#[derive(Debug)]
pub struct Resources<'a, R, T> {
    transport: &'a T,
    base_url: &'a Url,
    kind: PhantomData<fn() -> R>,
}

impl<R: Resource, T: Transport> Resources<'_, R, T> {
    /// A blank resource for the caller to fill in. Does not touch the server.
    pub fn create(&self) -> R {
        R::default()
    }

    /// Every resource of this kind.
    pub fn all(&self) -> Result<Vec<R>, ApiError> {
        let endpoint = self.endpoint()?;
        fetch_all(self.transport, endpoint.url())
    }

    /// Every resource assigned to the given user.
    pub fn responsible(&self, user_id: u64) -> Result<Vec<R>, ApiError> {
        let endpoint = self.endpoint()?;
        fetch_all(self.transport, &endpoint.with_responsible(user_id))
    }

    /// Every resource matching a free-text query (name, phone, email, ...).
    pub fn query(&self, text: &str) -> Result<Vec<R>, ApiError> {
        let endpoint = self.endpoint()?;
        fetch_all(self.transport, &endpoint.with_query(text))
    }

    /// The resource with the given id.
    pub fn id(&self, id: u64) -> Result<R, ApiError> {
        let endpoint = self.endpoint()?;
        fetch_one(self.transport, &endpoint.with_id(id), R::KIND.name, id)
    }

    /// Create `resource` on the server and return its new id.
    pub fn add(&self, resource: &R) -> Result<u64, ApiError> {
        let outcome = self.mutate(Mutation::Add, resource)?;
        if let MutationOutcome::PartiallyFailed { failures, .. } = &outcome {
            if let Some((id, reason)) = failures.iter().next() {
                return Err(self.rejected(Mutation::Add, id, reason));
            }
        }
        match outcome.items().first() {
            Some(item) if item.id != 0 => Ok(item.id),
            Some(_) => Err(ApiError::DeserializationError(format!(
                "add {} response carried id 0",
                R::KIND.name
            ))),
            None => Err(ApiError::DeserializationError(format!(
                "add {} response carried no items",
                R::KIND.name
            ))),
        }
    }

    /// Write `resource` back to the server. Fails with `PartialMutation` when
    /// the server rejects the record inside an otherwise successful response.
    pub fn update(&self, resource: &R) -> Result<(), ApiError> {
        let id = resource
            .id()
            .ok_or(ApiError::MissingId { kind: R::KIND.name })?;
        let outcome = self.mutate(Mutation::Update, resource)?;
        let MutationOutcome::PartiallyFailed { failures, .. } = &outcome else {
            return Ok(());
        };
        let own_id = id.to_string();
        if let Some(reason) = failures.get(&own_id) {
            return Err(self.rejected(Mutation::Update, &own_id, reason));
        }
        log::warn!(
            "update {} {id} reported failures for other ids: {failures:?}",
            R::KIND.name
        );
        match failures.iter().next() {
            Some((other, reason)) => Err(self.rejected(Mutation::Update, other, reason)),
            None => Ok(()),
        }
    }

    fn mutate(&self, mutation: Mutation, resource: &R) -> Result<MutationOutcome, ApiError> {
        let endpoint = self.endpoint()?;
        let now = chrono::Utc::now().timestamp();
        let payload = resource.project(mutation, now);
        let body = encode_batch(mutation, &[payload])?;
        log::debug!(
            "sending {mutation} {} data: {}",
            R::KIND.name,
            String::from_utf8_lossy(&body)
        );
        let response = self.transport.post(endpoint.url().as_str(), body)?;
        log::debug!(
            "{mutation} {} response data: {}",
            R::KIND.name,
            String::from_utf8_lossy(&response)
        );
        decode_mutation(&response, mutation)
    }

    fn rejected(&self, mutation: Mutation, id: &str, reason: &str) -> ApiError {
        ApiError::PartialMutation {
            operation: mutation.as_str(),
            kind: R::KIND.name,
            id: id.to_string(),
            reason: reason.to_string(),
        }
    }

    fn endpoint(&self) -> Result<Endpoint, ApiError> {
        Endpoint::new(self.base_url, &R::KIND)
    }
}
