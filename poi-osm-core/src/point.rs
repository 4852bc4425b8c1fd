//! Geographic positions and the provenance of a query's center.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A WGS84 position in decimal degrees.
///
/// `(0.0, 0.0)` doubles as the "no coordinates" sentinel that the geocoder
/// rejects; see [`GeoPoint::is_unset`].
///
/// # Examples
/// ```
/// use poi_osm_core::GeoPoint;
///
/// let munich = GeoPoint::new(48.137_43, 11.575_49);
/// assert!(!munich.is_unset());
/// assert!(munich.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lon: f64,
}

/// Errors returned by [`GeoPoint::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    /// A component was NaN or infinite.
    #[error("coordinates must be finite numbers")]
    NonFinite,
    /// Latitude outside `[-90, 90]`.
    #[error("latitude {lat} is outside [-90, 90]")]
    LatitudeOutOfRange {
        /// Offending latitude.
        lat: f64,
    },
    /// Longitude outside `[-180, 180]`.
    #[error("longitude {lon} is outside [-180, 180]")]
    LongitudeOutOfRange {
        /// Offending longitude.
        lon: f64,
    },
}

impl GeoPoint {
    /// Construct a point from latitude and longitude.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether both components are exactly zero.
    ///
    /// Geocoding treats this as a failed lookup rather than a position in the
    /// Gulf of Guinea.
    #[must_use]
    pub const fn is_unset(&self) -> bool {
        self.lat == 0.0 && self.lon == 0.0
    }

    /// Check that the point is finite and inside the WGS84 ranges.
    ///
    /// # Errors
    ///
    /// Returns a [`CoordinateError`] describing the first violated bound.
    pub fn validate(&self) -> Result<(), CoordinateError> {
        if !self.lat.is_finite() || !self.lon.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(CoordinateError::LatitudeOutOfRange { lat: self.lat });
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(CoordinateError::LongitudeOutOfRange { lon: self.lon });
        }
        Ok(())
    }
}

/// What the caller asked for, echoed unchanged into the result envelope.
///
/// Serialises as `{"address": .., "lat": .., "lon": ..}` with the fields of
/// the absent variant set to `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "QueryInputRecord", try_from = "QueryInputRecord")]
pub enum QueryInput {
    /// A free-form address to be geocoded.
    Address(String),
    /// Explicit center coordinates.
    Coordinates(GeoPoint),
}

#[derive(Serialize, Deserialize)]
struct QueryInputRecord {
    address: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl From<QueryInput> for QueryInputRecord {
    fn from(input: QueryInput) -> Self {
        match input {
            QueryInput::Address(address) => Self {
                address: Some(address),
                lat: None,
                lon: None,
            },
            QueryInput::Coordinates(point) => Self {
                address: None,
                lat: Some(point.lat),
                lon: Some(point.lon),
            },
        }
    }
}

impl TryFrom<QueryInputRecord> for QueryInput {
    type Error = String;

    fn try_from(record: QueryInputRecord) -> Result<Self, Self::Error> {
        match record {
            QueryInputRecord {
                address: Some(address),
                lat: None,
                lon: None,
            } => Ok(Self::Address(address)),
            QueryInputRecord {
                address: None,
                lat: Some(lat),
                lon: Some(lon),
            } => Ok(Self::Coordinates(GeoPoint::new(lat, lon))),
            _ => Err("query input needs either an address or both lat and lon".to_owned()),
        }
    }
}
