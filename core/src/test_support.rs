//! In-memory transport for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;

/// Replays queued responses in order and records every request it receives.
/// Running out of responses is reported as a network error.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    responses: RefCell<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, status: u16, body: &str) {
        self.responses.borrow_mut().push_back(Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }));
    }

    pub(crate) fn fail(&self, err: TransportError) {
        self.responses.borrow_mut().push_back(Err(err));
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub(crate) fn request_body(&self, index: usize) -> serde_json::Value {
        let requests = self.requests.borrow();
        let body = requests[index].body.as_deref().unwrap();
        serde_json::from_slice(body).unwrap()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.borrow_mut().push(request);
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("no scripted response".to_string())))
    }
}

/// A list envelope holding `count` contacts numbered from `first_id`.
pub(crate) fn contact_page(first_id: u64, count: usize) -> String {
    let items: Vec<serde_json::Value> = (0..count as u64)
        .map(|n| {
            serde_json::json!({
                "id": first_id + n,
                "name": format!("Contact {}", first_id + n),
                "responsible_user_id": 11,
            })
        })
        .collect();
    serde_json::json!({
        "_links": {"self": {"href": "/api/v2/contacts", "method": "get"}},
        "_embedded": {"items": items},
    })
    .to_string()
}
