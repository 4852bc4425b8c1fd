//! Test utilities for the query pipeline.
//!
//! [`StubTransport`] replays queued bodies or errors instead of touching the
//! network, and records every request it receives so tests can assert on the
//! exact URLs and form bodies the client produced.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::VecDeque;

use crate::{QueryError, Transport};

/// A request observed by [`StubTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Full request URL, including any query string.
    pub url: String,
    /// Form body for POST requests; `None` for GET.
    pub body: Option<String>,
}

/// Deterministic [`Transport`] returning pre-configured responses in order.
///
/// Once the queue is exhausted every further request fails with
/// [`QueryError::Transport`].
///
/// # Example
///
/// ```
/// use poi_osm_core::test_support::StubTransport;
/// use poi_osm_core::Transport;
///
/// let transport = StubTransport::new().with_response("[]");
/// assert_eq!(transport.request("http://geo.test/search", None).as_deref(), Ok("[]"));
/// assert!(transport.request("http://geo.test/search", None).is_err());
/// assert_eq!(transport.requests().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct StubTransport {
    responses: RefCell<VecDeque<Result<String, QueryError>>>,
    requests: RefCell<Vec<RecordedRequest>>,
}

impl StubTransport {
    /// Create a transport with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response body.
    #[must_use]
    pub fn with_response(self, body: impl Into<String>) -> Self {
        self.responses.borrow_mut().push_back(Ok(body.into()));
        self
    }

    /// Queue a failure.
    #[must_use]
    pub fn with_error(self, error: QueryError) -> Self {
        self.responses.borrow_mut().push_back(Err(error));
        self
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.borrow().clone()
    }
}

impl Transport for StubTransport {
    fn request(&self, url: &str, body: Option<&str>) -> Result<String, QueryError> {
        self.requests.borrow_mut().push(RecordedRequest {
            url: url.to_owned(),
            body: body.map(str::to_owned),
        });
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| {
                Err(QueryError::Transport {
                    url: url.to_owned(),
                    message: "no stubbed response left".to_owned(),
                })
            })
    }
}

/// Recover the Overpass QL text from a `data=` form body.
///
/// Returns `None` when the body lacks the `data=` prefix or is not valid
/// percent-encoded UTF-8.
#[must_use]
pub fn decode_overpass_form(body: &str) -> Option<String> {
    let encoded = body.strip_prefix("data=")?;
    urlencoding::decode(encoded).ok().map(Cow::into_owned)
}
