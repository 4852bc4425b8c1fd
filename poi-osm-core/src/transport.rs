//! Blocking HTTP seam between the query pipeline and the network.

use crate::QueryError;

/// Issue a single blocking HTTP request and return the response body.
///
/// Implementations send a GET when `body` is `None` and a form-encoded POST
/// otherwise. They must follow redirects, map connection-level failures to
/// [`QueryError::Transport`], and map any status of 400 or above to
/// [`QueryError::Http`] without reading the body. Implementations must not
/// retry.
///
/// # Examples
///
/// ```rust
/// use poi_osm_core::{QueryError, Transport};
///
/// struct Offline;
///
/// impl Transport for Offline {
///     fn request(&self, url: &str, _body: Option<&str>) -> Result<String, QueryError> {
///         Err(QueryError::Transport {
///             url: url.to_owned(),
///             message: "offline".to_owned(),
///         })
///     }
/// }
///
/// assert!(Offline.request("https://example.org", None).is_err());
/// ```
pub trait Transport {
    /// Perform the request described by `url` and `body`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Transport`] or [`QueryError::Http`].
    fn request(&self, url: &str, body: Option<&str>) -> Result<String, QueryError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn request(&self, url: &str, body: Option<&str>) -> Result<String, QueryError> {
        (**self).request(url, body)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn request(&self, url: &str, body: Option<&str>) -> Result<String, QueryError> {
        (**self).request(url, body)
    }
}
