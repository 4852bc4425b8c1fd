//! Versioned output documents.
//!
//! Downstream consumers rely on the field names and nesting here; bump
//! [`SCHEMA_VERSION`] for any structural change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{GeoPoint, QueryInput, Tags, Whitelist};

/// Structural version of [`ResultEnvelope`] and [`ErrorEnvelope`].
pub const SCHEMA_VERSION: u32 = 1;

/// Layout of `timestamp_utc`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Render `instant` as `YYYY-MM-DDTHH:MM:SSZ`.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use poi_osm_core::envelope::format_timestamp;
///
/// let instant = Utc.with_ymd_and_hms(2026, 2, 15, 9, 30, 5).single().expect("valid");
/// assert_eq!(format_timestamp(instant), "2026-02-15T09:30:05Z");
/// ```
#[must_use]
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.format(TIMESTAMP_FORMAT).to_string()
}

/// Successful query output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    /// Always [`SCHEMA_VERSION`].
    pub schema_version: u32,
    /// Where the data came from.
    pub source: Source,
    /// The query as it was executed.
    pub query: QueryEcho,
    /// Accepted POIs.
    pub results: Results,
}

/// Provenance metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Data provider, `OpenStreetMap`.
    pub provider: String,
    /// Geocoding service, `Nominatim`.
    pub geocoder: String,
    /// Overpass interpreter URL that served the query.
    pub overpass_endpoint: String,
}

impl Source {
    /// OpenStreetMap data via Nominatim and the given Overpass endpoint.
    #[must_use]
    pub fn openstreetmap(overpass_endpoint: impl Into<String>) -> Self {
        Self {
            provider: "OpenStreetMap".to_owned(),
            geocoder: "Nominatim".to_owned(),
            overpass_endpoint: overpass_endpoint.into(),
        }
    }
}

/// Echo of the query parameters, kept for provenance and debugging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEcho {
    /// Address or coordinates exactly as supplied.
    pub input: QueryInput,
    /// Center actually searched around.
    pub resolved_center: GeoPoint,
    /// Search radius in meters.
    pub radius_m: u32,
    /// Tag filters applied.
    pub whitelist: Whitelist,
    /// When the query ran, `YYYY-MM-DDTHH:MM:SSZ`.
    pub timestamp_utc: String,
}

impl QueryEcho {
    /// Capture the parameters of a query executed at `executed_at`.
    #[must_use]
    pub fn new(
        input: QueryInput,
        resolved_center: GeoPoint,
        radius_m: u32,
        whitelist: Whitelist,
        executed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            input,
            resolved_center,
            radius_m,
            whitelist,
            timestamp_utc: format_timestamp(executed_at),
        }
    }
}

/// Accepted POIs and their count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Results {
    /// Always `pois.len()`.
    pub count: usize,
    /// POIs in upstream order.
    pub pois: Vec<Poi>,
}

impl From<Vec<Poi>> for Results {
    fn from(pois: Vec<Poi>) -> Self {
        Self {
            count: pois.len(),
            pois,
        }
    }
}

/// A normalised point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Display name, `null` when the node is unnamed.
    pub name: Option<String>,
    /// All OSM tags, copied verbatim.
    pub tags: Tags,
}

/// Failure output emitted in place of a [`ResultEnvelope`].
///
/// # Examples
/// ```
/// use poi_osm_core::ErrorEnvelope;
///
/// let envelope = ErrorEnvelope::new("no geocoding result for address");
/// let json = serde_json::to_string(&envelope)?;
/// assert_eq!(json, r#"{"schema_version":1,"error":"no geocoding result for address"}"#);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always [`SCHEMA_VERSION`].
    pub schema_version: u32,
    /// Human-readable failure message.
    pub error: String,
}

impl ErrorEnvelope {
    /// Wrap `message` in a versioned envelope.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            error: message.into(),
        }
    }
}
