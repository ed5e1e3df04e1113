//! URL construction for resource endpoints.
//!
//! Every filter is expressed purely in the query string, so the paginated
//! fetcher can treat all list variants the same way.

use url::Url;

use crate::error::ApiError;
use crate::pagination::PAGE_LIMIT;
use crate::resources::ResourceKind;

/// The list endpoint of one resource kind, e.g. `<base>/api/v2/contacts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
}

impl Endpoint {
    pub fn new(base: &Url, kind: &ResourceKind) -> Result<Self, ApiError> {
        let mut base = base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let url = base.join(&format!("api/v2/{}", kind.path))?;
        Ok(Self { url })
    }

    /// The unfiltered list URL, also the target of every mutation.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn with_id(&self, id: u64) -> Url {
        self.with_pair("id", &id.to_string())
    }

    pub fn with_responsible(&self, user_id: u64) -> Url {
        self.with_pair("responsible_user_id", &user_id.to_string())
    }

    pub fn with_query(&self, query: &str) -> Url {
        self.with_pair("query", query)
    }

    fn with_pair(&self, key: &str, value: &str) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair(key, value);
        url
    }
}

/// Address page `page` (zero-based) of a list URL. The server counts
/// `limit_offset` in rows, so the page index is scaled by the page limit.
pub fn with_offset(url: &Url, page: usize) -> Url {
    let mut url = url.clone();
    url.query_pairs_mut()
        .append_pair("limit_rows", &PAGE_LIMIT.to_string())
        .append_pair("limit_offset", &page.saturating_mul(PAGE_LIMIT).to_string());
    url
}
