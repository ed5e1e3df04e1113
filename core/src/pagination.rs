//! Offset pagination over list endpoints.
//!
//! The server returns at most [`PAGE_LIMIT`] items per request and reports
//! neither a total nor a "has more" flag. The only end-of-data signal is a
//! short page, so pages are fetched strictly in order until one comes back
//! with fewer than `PAGE_LIMIT` items. When the true total is an exact
//! multiple of the limit this costs one extra request that returns nothing.

use serde::de::DeserializeOwned;
use url::Url;

use crate::endpoint::with_offset;
use crate::envelope::decode_page;
use crate::error::ApiError;
use crate::transport::Transport;

/// Rows per page, fixed by the server.
pub const PAGE_LIMIT: usize = 500;

/// Fetch every item reachable from the list URL `base`.
///
/// Any transport or decode error aborts the loop and discards what was
/// accumulated so far.
pub fn fetch_all<R, T>(transport: &T, base: &Url) -> Result<Vec<R>, ApiError>
where
    R: DeserializeOwned,
    T: Transport + ?Sized,
{
    let mut items = Vec::new();
    for page in 0.. {
        let url = with_offset(base, page);
        let body = transport.get(url.as_str())?;
        let batch: Vec<R> = decode_page(&body)?;
        let received = batch.len();
        log::debug!("fetched page {page} from {base}: {received} items");
        items.extend(batch);
        if received < PAGE_LIMIT {
            break;
        }
    }
    Ok(items)
}

/// Fetch the first item at `url`, failing with `NotFound` when there is none.
pub fn fetch_one<R, T>(transport: &T, url: &Url, kind: &'static str, id: u64) -> Result<R, ApiError>
where
    R: DeserializeOwned,
    T: Transport + ?Sized,
{
    let body = transport.get(url.as_str())?;
    decode_page::<R>(&body)?
        .into_iter()
        .next()
        .ok_or(ApiError::NotFound { kind, id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::envelope::MutatedItem;
    use crate::test_support::{contact_page, ScriptedTransport};

    fn base() -> Url {
        Url::parse("http://crm.test/api/v2/contacts").unwrap()
    }

    fn script(transport: &ScriptedTransport, sizes: &[usize]) {
        let mut next_id = 1;
        for &size in sizes {
            transport.respond(200, &contact_page(next_id, size));
            next_id += size as u64;
        }
    }

    #[test]
    fn stitches_pages_until_a_short_page() {
        let transport = ScriptedTransport::new();
        script(&transport, &[500, 500, 500, 217]);

        let items: Vec<MutatedItem> = fetch_all(&transport, &base()).unwrap();

        assert_eq!(items.len(), 1717);
        assert_eq!(transport.requests().len(), 4);
        let ids: Vec<u64> = items.iter().map(|item| item.id).collect();
        assert_eq!(ids, (1..=1717).collect::<Vec<u64>>());
    }

    #[test]
    fn full_last_page_costs_one_empty_request() {
        let transport = ScriptedTransport::new();
        script(&transport, &[500]);
        transport.respond(204, "");

        let items: Vec<MutatedItem> = fetch_all(&transport, &base()).unwrap();

        assert_eq!(items.len(), 500);
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn exact_multiple_issues_trailing_request() {
        let transport = ScriptedTransport::new();
        script(&transport, &[500, 500, 500, 500, 0]);

        let items: Vec<MutatedItem> = fetch_all(&transport, &base()).unwrap();

        assert_eq!(items.len(), 2000);
        assert_eq!(transport.requests().len(), 5);
    }

    #[test]
    fn empty_first_page_yields_empty_collection() {
        let transport = ScriptedTransport::new();
        transport.respond(204, "");

        let items: Vec<MutatedItem> = fetch_all(&transport, &base()).unwrap();

        assert!(items.is_empty());
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn requests_advance_the_row_offset() {
        let transport = ScriptedTransport::new();
        script(&transport, &[500, 3]);

        let _: Vec<MutatedItem> = fetch_all(&transport, &base()).unwrap();

        let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            vec![
                "http://crm.test/api/v2/contacts?limit_rows=500&limit_offset=0".to_string(),
                "http://crm.test/api/v2/contacts?limit_rows=500&limit_offset=500".to_string(),
            ]
        );
    }

    #[test]
    fn transport_error_mid_pagination_aborts() {
        let transport = ScriptedTransport::new();
        script(&transport, &[500]);
        transport.fail(TransportError::TimedOut);
        transport.respond(200, &contact_page(1001, 10));

        let err = fetch_all::<MutatedItem, _>(&transport, &base()).unwrap_err();

        assert!(matches!(err, ApiError::Transport(TransportError::TimedOut)));
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn decode_error_aborts() {
        let transport = ScriptedTransport::new();
        transport.respond(200, "not json");

        let err = fetch_all::<MutatedItem, _>(&transport, &base()).unwrap_err();

        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn fetch_one_returns_first_item() {
        let transport = ScriptedTransport::new();
        transport.respond(200, &contact_page(42, 1));

        let url = Url::parse("http://crm.test/api/v2/contacts?id=42").unwrap();
        let item: MutatedItem = fetch_one(&transport, &url, "contact", 42).unwrap();

        assert_eq!(item.id, 42);
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn fetch_one_on_empty_items_is_not_found() {
        let transport = ScriptedTransport::new();
        transport.respond(200, r#"{"_embedded":{"items":[]}}"#);

        let url = Url::parse("http://crm.test/api/v2/contacts?id=42").unwrap();
        let err = fetch_one::<MutatedItem, _>(&transport, &url, "contact", 42).unwrap_err();

        assert!(matches!(err, ApiError::NotFound { kind: "contact", id: 42 }));
    }
}
