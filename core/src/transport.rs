//! The I/O seam between the resource client and the network.
//!
//! # Design
//! The core never opens a socket itself. Everything it needs from the network
//! is `GET url` and `POST url body`, both answering with the raw response
//! body. Implementors only provide [`Transport::send`]; the provided `get` and
//! `post` methods turn non-2xx statuses into [`TransportError::Status`] so
//! callers see a single error path. A partially failed mutation still arrives
//! as a 2xx body and is interpreted by the envelope codec, not here.
//!
//! [`UreqTransport`] is the blocking implementation used in production and in
//! the live integration tests.

use std::time::Duration;

use url::Url;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Performs HTTP round-trips on behalf of the core.
pub trait Transport {
    /// Execute `request` and return the response as data. Non-2xx statuses
    /// are returned as `Ok`; only failures to obtain a response are errors.
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// GET `url` and return the body of a 2xx response.
    fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        check_status(self.send(HttpRequest::get(url))?)
    }

    /// POST a JSON `body` to `url` and return the body of a 2xx response.
    fn post(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        check_status(self.send(HttpRequest::post_json(url, body))?)
    }
}

fn check_status(response: HttpResponse) -> Result<Vec<u8>, TransportError> {
    if response.is_success() {
        return Ok(response.body);
    }
    Err(TransportError::Status {
        status: response.status,
        body: String::from_utf8_lossy(&response.body).into_owned(),
    })
}

/// API credentials sent with every request as `USER_LOGIN` / `USER_HASH`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login: String,
    pub api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    credentials: Option<Credentials>,
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self {
            agent,
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    fn authorize(&self, url: &str) -> Result<String, TransportError> {
        let Some(credentials) = &self.credentials else {
            return Ok(url.to_string());
        };
        let mut url = Url::parse(url).map_err(|e| TransportError::Network(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("USER_LOGIN", &credentials.login)
            .append_pair("USER_HASH", &credentials.api_key);
        Ok(url.into())
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = self.authorize(&request.url)?;
        let result = match (request.method, request.body) {
            (HttpMethod::Get, _) => {
                let mut builder = self.agent.get(&url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            (HttpMethod::Post, body) => {
                let mut builder = self.agent.post(&url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match body {
                    Some(body) => builder.send(&body[..]),
                    None => builder.send_empty(),
                }
            }
        };
        let mut response = result.map_err(map_ureq_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.body_mut().read_to_vec().map_err(map_ureq_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_ureq_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::TimedOut,
        other => TransportError::Network(other.to_string()),
    }
}
