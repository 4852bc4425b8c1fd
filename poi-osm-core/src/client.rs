//! The query client chaining geocoding, query building, transport and
//! normalisation.

use chrono::Utc;
use log::debug;

use crate::geocode::{DEFAULT_NOMINATIM_URL, geocode_url, parse_geocode_response};
use crate::{
    GeoPoint, NamePreference, QueryEcho, QueryError, QueryInput, ResultEnvelope, Source,
    Transport, Whitelist, build_overpass_query, normalize,
};

/// Public Overpass interpreter endpoint.
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Default search radius in meters.
pub const DEFAULT_RADIUS_M: u32 = 100_000;

/// Upstream endpoints and output options for [`PoiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Nominatim search endpoint.
    pub nominatim_url: String,
    /// Overpass interpreter endpoint.
    pub overpass_url: String,
    /// Which tag supplies POI names.
    pub names: NamePreference,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            nominatim_url: DEFAULT_NOMINATIM_URL.to_owned(),
            overpass_url: DEFAULT_OVERPASS_URL.to_owned(),
            names: NamePreference::default(),
        }
    }
}

impl ClientConfig {
    /// Set the Nominatim search endpoint.
    #[must_use]
    pub fn with_nominatim_url(mut self, url: impl Into<String>) -> Self {
        self.nominatim_url = url.into();
        self
    }

    /// Set the Overpass interpreter endpoint.
    #[must_use]
    pub fn with_overpass_url(mut self, url: impl Into<String>) -> Self {
        self.overpass_url = url.into();
        self
    }

    /// Set the name preference.
    #[must_use]
    pub const fn with_names(mut self, names: NamePreference) -> Self {
        self.names = names;
        self
    }
}

/// Query OpenStreetMap POIs around an address or a coordinate pair.
///
/// The client keeps no state between calls. Each call performs at most two
/// sequential round-trips through its [`Transport`]: a Nominatim lookup when
/// starting from an address, then the Overpass query.
///
/// # Examples
///
/// ```
/// use poi_osm_core::test_support::StubTransport;
/// use poi_osm_core::{GeoPoint, PoiClient, Whitelist, WhitelistEntry};
///
/// let transport = StubTransport::new().with_response(
///     r#"{"elements":[{"type":"node","lat":48.1,"lon":11.5,"tags":{"amenity":"cafe"}}]}"#,
/// );
/// let client = PoiClient::new(&transport);
/// let whitelist = Whitelist::from(vec![WhitelistEntry::key("amenity")]);
///
/// let envelope = client.query_by_coordinates(GeoPoint::new(48.1, 11.5), 250, &whitelist)?;
/// assert_eq!(envelope.results.count, 1);
/// # Ok::<(), poi_osm_core::QueryError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PoiClient<T> {
    transport: T,
    config: ClientConfig,
}

impl<T: Transport> PoiClient<T> {
    /// Create a client using the public OpenStreetMap endpoints.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ClientConfig::default())
    }

    /// Create a client with explicit configuration.
    #[must_use]
    pub const fn with_config(transport: T, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run a query for either kind of input.
    ///
    /// # Errors
    ///
    /// See [`PoiClient::query_by_address`] and
    /// [`PoiClient::query_by_coordinates`].
    pub fn query(
        &self,
        input: &QueryInput,
        radius_m: u32,
        whitelist: &Whitelist,
    ) -> Result<ResultEnvelope, QueryError> {
        match input {
            QueryInput::Address(address) => self.query_by_address(address, radius_m, whitelist),
            QueryInput::Coordinates(center) => {
                self.query_by_coordinates(*center, radius_m, whitelist)
            }
        }
    }

    /// Geocode `address`, then query POIs around the result.
    ///
    /// # Errors
    ///
    /// Any [`QueryError`] from geocoding, transport or normalisation; the
    /// first failure aborts the call.
    pub fn query_by_address(
        &self,
        address: &str,
        radius_m: u32,
        whitelist: &Whitelist,
    ) -> Result<ResultEnvelope, QueryError> {
        let center = self.geocode(address)?;
        self.query_overpass(
            QueryInput::Address(address.to_owned()),
            center,
            radius_m,
            whitelist,
        )
    }

    /// Query POIs around `center`.
    ///
    /// # Errors
    ///
    /// Any [`QueryError`] from transport or normalisation.
    pub fn query_by_coordinates(
        &self,
        center: GeoPoint,
        radius_m: u32,
        whitelist: &Whitelist,
    ) -> Result<ResultEnvelope, QueryError> {
        self.query_overpass(QueryInput::Coordinates(center), center, radius_m, whitelist)
    }

    /// Resolve `address` to the coordinates of Nominatim's first match.
    ///
    /// # Errors
    ///
    /// [`QueryError::EmptyResult`] when nothing matched, otherwise transport
    /// or parse failures.
    pub fn geocode(&self, address: &str) -> Result<GeoPoint, QueryError> {
        let url = geocode_url(&self.config.nominatim_url, address);
        debug!("geocoding {address:?} via {}", self.config.nominatim_url);
        let body = self.transport.request(&url, None)?;
        let center = parse_geocode_response(&body)?;
        debug!("resolved {address:?} to {},{}", center.lat, center.lon);
        Ok(center)
    }

    fn query_overpass(
        &self,
        input: QueryInput,
        center: GeoPoint,
        radius_m: u32,
        whitelist: &Whitelist,
    ) -> Result<ResultEnvelope, QueryError> {
        let query = build_overpass_query(center, radius_m, whitelist);
        debug!(
            "posting Overpass query to {}: {query}",
            self.config.overpass_url
        );
        let form = format!("data={}", urlencoding::encode(&query));
        let body = self.transport.request(&self.config.overpass_url, Some(&form))?;

        let echo = QueryEcho::new(input, center, radius_m, whitelist.clone(), Utc::now());
        normalize(
            &body,
            echo,
            Source::openstreetmap(self.config.overpass_url.as_str()),
            self.config.names,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WhitelistEntry;
    use crate::test_support::{RecordedRequest, StubTransport, decode_overpass_form};
    use rstest::rstest;

    const MUNICH_GEOCODE: &str = r#"[{"lat":"48.1371079","lon":"11.5753822"}]"#;

    #[rstest]
    fn coordinates_skip_geocoding() {
        let transport = StubTransport::new().with_response(r#"{"elements":[]}"#);
        let client = PoiClient::new(&transport);

        client
            .query_by_coordinates(GeoPoint::new(1.0, 2.0), 10, &Whitelist::new())
            .expect("query should succeed");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, DEFAULT_OVERPASS_URL);
    }

    #[rstest]
    fn address_geocodes_then_posts_query() {
        let transport = StubTransport::new()
            .with_response(MUNICH_GEOCODE)
            .with_response(r#"{"elements":[]}"#);
        let config = ClientConfig::default()
            .with_nominatim_url("http://geo.test/search")
            .with_overpass_url("http://overpass.test/api/interpreter");
        let client = PoiClient::with_config(&transport, config);

        let envelope = client
            .query_by_address("Marienplatz, München", 1000, &Whitelist::new())
            .expect("query should succeed");

        let requests = transport.requests();
        assert_eq!(
            requests[0],
            RecordedRequest {
                url: "http://geo.test/search?q=Marienplatz%2C%20M%C3%BCnchen&format=json&limit=1"
                    .to_owned(),
                body: None,
            }
        );
        assert_eq!(requests[1].url, "http://overpass.test/api/interpreter");
        let query = decode_overpass_form(requests[1].body.as_deref().expect("form body"))
            .expect("decodable form");
        assert!(query.contains("around:1000,48.137108,11.575382"));
        assert_eq!(
            envelope.query.input,
            QueryInput::Address("Marienplatz, München".to_owned())
        );
        assert_eq!(
            envelope.query.resolved_center,
            GeoPoint::new(48.137_107_9, 11.575_382_2)
        );
        assert_eq!(
            envelope.source.overpass_endpoint,
            "http://overpass.test/api/interpreter"
        );
    }

    #[rstest]
    fn geocoding_failure_stops_before_overpass() {
        let transport = StubTransport::new().with_response("[]");
        let client = PoiClient::new(&transport);

        let err = client
            .query_by_address("Atlantis", 100, &Whitelist::new())
            .expect_err("empty geocode should fail");

        assert_eq!(err, QueryError::EmptyResult);
        assert_eq!(transport.requests().len(), 1);
    }

    #[rstest]
    fn transport_errors_propagate_unchanged() {
        let failure = QueryError::Http {
            url: DEFAULT_OVERPASS_URL.to_owned(),
            status: 429,
        };
        let transport = StubTransport::new().with_error(failure.clone());
        let client = PoiClient::new(&transport);

        let err = client
            .query_by_coordinates(GeoPoint::new(1.0, 1.0), 10, &Whitelist::new())
            .expect_err("http error should surface");

        assert_eq!(err, failure);
    }

    #[rstest]
    fn query_dispatches_on_input_variant() {
        let transport = StubTransport::new()
            .with_response(MUNICH_GEOCODE)
            .with_response(r#"{"elements":[]}"#);
        let client = PoiClient::new(&transport);
        let whitelist = Whitelist::from(vec![WhitelistEntry::key("amenity")]);

        let envelope = client
            .query(&QueryInput::Address("Munich".to_owned()), 50, &whitelist)
            .expect("query should succeed");

        assert_eq!(transport.requests().len(), 2);
        assert_eq!(envelope.query.whitelist, whitelist);
        assert_eq!(envelope.query.radius_m, 50);
    }

    #[rstest]
    fn english_names_are_configurable() {
        let transport = StubTransport::new().with_response(
            r#"{"elements":[{"type":"node","lat":1.0,"lon":1.0,"tags":{"name":"Köln","name:en":"Cologne"}}]}"#,
        );
        let config = ClientConfig::default().with_names(NamePreference::English);
        let client = PoiClient::with_config(&transport, config);

        let envelope = client
            .query_by_coordinates(GeoPoint::new(1.0, 1.0), 10, &Whitelist::new())
            .expect("query should succeed");

        assert_eq!(envelope.results.pois[0].name.as_deref(), Some("Cologne"));
    }
}
