//! HTTP transport for the OpenStreetMap POI query pipeline.
//!
//! Provides [`HttpTransport`], the production implementation of
//! [`poi_osm_core::Transport`].

#![forbid(unsafe_code)]

mod transport;

pub use transport::{
    DEFAULT_REFERER, DEFAULT_USER_AGENT, HttpTransport, HttpTransportConfig, MAX_REDIRECTS,
    TransportBuildError,
};
