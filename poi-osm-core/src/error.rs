//! Failure taxonomy shared by every stage of a POI query.

use thiserror::Error;

/// Errors returned by [`crate::PoiClient`] and the stages it chains.
///
/// Every variant renders a human-readable message; the CLI boundary copies
/// that message verbatim into the `error` field of the failure envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The request never produced an HTTP response (DNS, connect, TLS,
    /// timeout, or body read failure).
    #[error("request to {url} failed: {message}")]
    Transport {
        /// Target URL of the failed request.
        url: String,
        /// Diagnostic text from the HTTP stack.
        message: String,
    },
    /// The upstream service answered with a status code of 400 or above.
    #[error("HTTP error {status} from {url}")]
    Http {
        /// Target URL of the failed request.
        url: String,
        /// HTTP status code returned by the service.
        status: u16,
    },
    /// The response body was not valid JSON, or carried values that could
    /// not be interpreted.
    #[error("parse error: {message}")]
    Parse {
        /// What went wrong while parsing.
        message: String,
    },
    /// The response was JSON but not shaped the way the service documents.
    #[error("malformed response: {message}")]
    MalformedResponse {
        /// Which expectation the response violated.
        message: String,
    },
    /// The geocoder found no match for the address.
    #[error("no geocoding result for address")]
    EmptyResult,
    /// Overpass reported an application-level error through `remark`.
    #[error("Overpass API error: {remark}")]
    Upstream {
        /// The `remark` text as returned by Overpass.
        remark: String,
    },
    /// Overpass answered with an HTML error page instead of JSON.
    #[error("Overpass API returned an HTML error page (server might be busy)")]
    ServiceOverloaded,
}

impl QueryError {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }
}
