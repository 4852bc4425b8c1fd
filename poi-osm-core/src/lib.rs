//! Core pipeline for querying OpenStreetMap points of interest.
//!
//! A query starts from an address or a coordinate pair. Addresses are
//! resolved through Nominatim, the center is turned into an Overpass QL
//! query, and the Overpass answer is normalised into a versioned
//! [`ResultEnvelope`]. Network access goes through the [`Transport`] trait so
//! the pipeline itself stays free of I/O.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;

mod client;
pub mod envelope;
mod error;
pub mod geocode;
mod normalize;
mod point;
mod query;
mod transport;
mod whitelist;

#[doc(hidden)]
pub mod test_support;

pub use client::{ClientConfig, DEFAULT_OVERPASS_URL, DEFAULT_RADIUS_M, PoiClient};
pub use envelope::{
    ErrorEnvelope, Poi, QueryEcho, ResultEnvelope, Results, SCHEMA_VERSION, Source,
};
pub use error::QueryError;
pub use geocode::DEFAULT_NOMINATIM_URL;
pub use normalize::{NamePreference, NamePreferenceError, normalize};
pub use point::{CoordinateError, GeoPoint, QueryInput};
pub use query::{SERVER_TIMEOUT_SECS, build_overpass_query};
pub use transport::Transport;
pub use whitelist::{Whitelist, WhitelistEntry, WhitelistEntryError};

/// OSM tags of an element, ordered by key.
pub type Tags = BTreeMap<String, String>;
