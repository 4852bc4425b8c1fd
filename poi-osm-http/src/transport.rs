//! Blocking [`Transport`] backed by `reqwest`.
//!
//! [`Transport`] is synchronous so the query pipeline stays embeddable in
//! synchronous programs. [`HttpTransport`] bridges the asynchronous HTTP
//! client to that interface by blocking on a Tokio runtime.
//!
//! # Example
//!
//! ```no_run
//! use poi_osm_core::{GeoPoint, PoiClient, Whitelist};
//! use poi_osm_http::HttpTransport;
//!
//! let transport = HttpTransport::new()?;
//! let client = PoiClient::new(transport);
//! let center = GeoPoint::new(48.137_43, 11.575_49);
//! let envelope = client.query_by_coordinates(center, 500, &Whitelist::new())?;
//! println!("{} POIs", envelope.results.count);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::error::Error as _;
use std::time::Duration;

use log::debug;
use poi_osm_core::{QueryError, Transport};
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, REFERER, USER_AGENT};
use reqwest::redirect::Policy;
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

/// Default `User-Agent`, identifying the client as the public OSM usage
/// policies require.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "poi-osm/",
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("CARGO_PKG_REPOSITORY"),
    ")"
);

/// Default `Referer` header value.
pub const DEFAULT_REFERER: &str = env!("CARGO_PKG_REPOSITORY");

/// Maximum number of redirects followed per request.
pub const MAX_REDIRECTS: usize = 10;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Error type for [`HttpTransport`] construction failures.
#[derive(Debug, Error)]
pub enum TransportBuildError {
    /// A configured header value contains characters HTTP does not allow.
    #[error("invalid {name} header value")]
    InvalidHeader {
        /// Header name.
        name: &'static str,
        /// Underlying validation error.
        #[source]
        source: reqwest::header::InvalidHeaderValue,
    },
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTransportConfig {
    /// `User-Agent` sent with every request.
    pub user_agent: String,
    /// `Referer` sent with every request.
    pub referer: String,
    /// Overall per-request timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            referer: DEFAULT_REFERER.to_owned(),
            timeout: None,
        }
    }
}

impl HttpTransportConfig {
    /// Create a configuration with the default headers and no timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the referer.
    #[must_use]
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = referer.into();
        self
    }

    fn headers(&self) -> Result<HeaderMap, TransportBuildError> {
        let header = |name: &'static str, value: &str| {
            HeaderValue::from_str(value)
                .map_err(|source| TransportBuildError::InvalidHeader { name, source })
        };
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header("User-Agent", &self.user_agent)?);
        headers.insert(REFERER, header("Referer", &self.referer)?);
        Ok(headers)
    }
}

/// Blocking HTTP transport for Nominatim and Overpass requests.
///
/// The transport owns a current-thread Tokio runtime created by
/// [`HttpTransport::new`] and released when the transport is dropped. Each
/// request builds its own `reqwest` client, so no connection state survives
/// between calls.
///
/// # Runtime behaviour
///
/// Outside any Tokio runtime the owned runtime drives the request. Inside a
/// multi-threaded runtime (detected via [`Handle::try_current()`] and
/// [`RuntimeFlavor::MultiThread`]) the caller's runtime is reused through
/// [`tokio::task::block_in_place`]. Inside a `current_thread` runtime the
/// owned runtime drives the request on a scoped helper thread; the caller's
/// executor makes no progress until the request completes.
///
/// Dropping the transport shuts the owned runtime down in the background, so
/// it may be dropped from async code.
pub struct HttpTransport {
    config: HttpTransportConfig,
    headers: HeaderMap,
    runtime: Option<Runtime>,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Create a transport with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the Tokio runtime fails to build.
    pub fn new() -> Result<Self, TransportBuildError> {
        Self::with_config(HttpTransportConfig::default())
    }

    /// Create a transport with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a header value is invalid or the Tokio runtime
    /// fails to build.
    pub fn with_config(config: HttpTransportConfig) -> Result<Self, TransportBuildError> {
        let headers = config.headers()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(TransportBuildError::Runtime)?;
        Ok(Self {
            config,
            headers,
            runtime: Some(runtime),
        })
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    fn client(&self, url: &str) -> Result<Client, QueryError> {
        let mut builder = Client::builder()
            .default_headers(self.headers.clone())
            .redirect(Policy::limited(MAX_REDIRECTS));
        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }
        builder.build().map_err(|err| transport_error(url, &err))
    }

    fn block_on_owned(&self, url: &str, body: Option<&str>) -> Result<String, QueryError> {
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| transport_failure(url, "runtime has shut down"))?;
        runtime.block_on(self.send(url, body))
    }

    async fn send(&self, url: &str, body: Option<&str>) -> Result<String, QueryError> {
        let client = self.client(url)?;
        let request = match body {
            None => client.get(url),
            Some(form) => client
                .post(url)
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(form.to_owned()),
        };

        let response = request
            .send()
            .await
            .map_err(|err| transport_error(url, &err))?;
        let status = response.status();
        debug!("{url} answered {status}");
        if status.as_u16() >= 400 {
            return Err(QueryError::Http {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|err| transport_error(url, &err))
    }
}

impl Transport for HttpTransport {
    /// Perform the request, blocking the calling thread until it completes.
    ///
    /// # Runtime requirements
    ///
    /// Any calling context works. A multi-threaded caller runtime is reused;
    /// a `current_thread` caller is blocked while a helper thread drives the
    /// owned runtime.
    fn request(&self, url: &str, body: Option<&str>) -> Result<String, QueryError> {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(self.send(url, body)))
            }
            Ok(_) => std::thread::scope(|scope| {
                scope
                    .spawn(|| self.block_on_owned(url, body))
                    .join()
                    .unwrap_or_else(|_| Err(transport_failure(url, "request thread panicked")))
            }),
            Err(_) => self.block_on_owned(url, body),
        }
    }
}

impl Drop for HttpTransport {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

fn transport_failure(url: &str, message: &str) -> QueryError {
    QueryError::Transport {
        url: url.to_owned(),
        message: message.to_owned(),
    }
}

/// Render `error` together with its source chain.
///
/// `reqwest` keeps the useful detail (DNS failure, refused connection,
/// elapsed timeout) in nested sources.
fn transport_error(url: &str, error: &reqwest::Error) -> QueryError {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    QueryError::Transport {
        url: url.to_owned(),
        message,
    }
}
