//! Facade crate for the OpenStreetMap POI query client.
//!
//! This crate re-exports the core query pipeline and, behind the default
//! `http` feature, the blocking HTTP transport.

#![forbid(unsafe_code)]

pub use poi_osm_core::{
    ClientConfig, CoordinateError, DEFAULT_NOMINATIM_URL, DEFAULT_OVERPASS_URL, DEFAULT_RADIUS_M,
    ErrorEnvelope, GeoPoint, NamePreference, Poi, PoiClient, QueryEcho, QueryError, QueryInput,
    ResultEnvelope, Results, SCHEMA_VERSION, Source, Tags, Transport, Whitelist, WhitelistEntry,
    build_overpass_query, normalize,
};

#[cfg(feature = "http")]
pub use poi_osm_http::{HttpTransport, HttpTransportConfig, TransportBuildError};
