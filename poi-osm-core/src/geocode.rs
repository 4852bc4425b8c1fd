//! Nominatim request construction and response interpretation.
//!
//! Only the first candidate is used. There is no disambiguation, caching, or
//! retry; a vague address simply resolves to whatever Nominatim ranks first.

use serde_json::Value;

use crate::{GeoPoint, QueryError};

/// Public Nominatim search endpoint.
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Build the search URL asking for at most one JSON match for `address`.
///
/// # Examples
/// ```
/// use poi_osm_core::geocode::geocode_url;
///
/// assert_eq!(
///     geocode_url("https://nominatim.example/search", "Marienplatz 1, München"),
///     "https://nominatim.example/search?q=Marienplatz%201%2C%20M%C3%BCnchen&format=json&limit=1"
/// );
/// ```
#[must_use]
pub fn geocode_url(endpoint: &str, address: &str) -> String {
    let separator = if endpoint.contains('?') { '&' } else { '?' };
    format!(
        "{endpoint}{separator}q={}&format=json&limit=1",
        urlencoding::encode(address)
    )
}

/// Extract the first match's coordinates from a Nominatim JSON body.
///
/// # Errors
///
/// - [`QueryError::Parse`] when the body is not JSON, a coordinate cannot be
///   read as a finite number, or the match resolves to `(0.0, 0.0)`.
/// - [`QueryError::MalformedResponse`] when the body is not a JSON array.
/// - [`QueryError::EmptyResult`] when the array is empty.
pub fn parse_geocode_response(body: &str) -> Result<GeoPoint, QueryError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|err| QueryError::parse(format!("invalid geocoding JSON: {err}")))?;
    let Value::Array(candidates) = value else {
        return Err(QueryError::malformed("geocoding response is not an array"));
    };
    let first = candidates.first().ok_or(QueryError::EmptyResult)?;

    let point = GeoPoint::new(coordinate(first, "lat")?, coordinate(first, "lon")?);
    if point.is_unset() {
        return Err(QueryError::parse("invalid coordinates in geocoding response"));
    }
    Ok(point)
}

/// Nominatim encodes coordinates as decimal strings; plain numbers are
/// accepted as well. A missing field reads as zero.
fn coordinate(candidate: &Value, field: &str) -> Result<f64, QueryError> {
    let parsed = match candidate.get(field) {
        None | Some(Value::Null) => 0.0,
        Some(Value::String(raw)) => raw.trim().parse::<f64>().map_err(|err| {
            QueryError::parse(format!("error parsing {field} {raw:?}: {err}"))
        })?,
        Some(Value::Number(number)) => number
            .as_f64()
            .ok_or_else(|| QueryError::parse(format!("{field} {number} is not representable")))?,
        Some(other) => {
            return Err(QueryError::parse(format!(
                "unexpected {field} value in geocoding response: {other}"
            )));
        }
    };
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(QueryError::parse(format!("{field} is not a finite number")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn reads_string_coordinates_of_first_match() {
        let body = r#"[
            {"lat": "48.1371079", "lon": "11.5753822", "display_name": "Marienplatz"},
            {"lat": "1.0", "lon": "2.0"}
        ]"#;
        let point = parse_geocode_response(body).expect("geocode should succeed");
        assert_eq!(point, GeoPoint::new(48.137_107_9, 11.575_382_2));
    }

    #[rstest]
    fn accepts_numeric_coordinates() {
        let point = parse_geocode_response(r#"[{"lat": -33.86, "lon": 151.21}]"#)
            .expect("numeric coordinates should parse");
        assert_eq!(point, GeoPoint::new(-33.86, 151.21));
    }

    #[rstest]
    fn empty_array_is_empty_result() {
        assert_eq!(parse_geocode_response("[]"), Err(QueryError::EmptyResult));
    }

    #[rstest]
    #[case(r#"[{"lat":"0.0","lon":"0.0"}]"#)]
    #[case(r#"[{"display_name":"nowhere"}]"#)]
    #[case(r#"["not an object"]"#)]
    fn zero_sentinel_is_rejected(#[case] body: &str) {
        let err = parse_geocode_response(body).expect_err("sentinel should fail");
        assert_eq!(
            err,
            QueryError::parse("invalid coordinates in geocoding response")
        );
    }

    #[rstest]
    #[case(r#"[{"lat":"north","lon":"1.0"}]"#)]
    #[case(r#"[{"lat":"NaN","lon":"1.0"}]"#)]
    #[case(r#"[{"lat":true,"lon":"1.0"}]"#)]
    #[case("not json")]
    fn unreadable_values_are_parse_errors(#[case] body: &str) {
        let err = parse_geocode_response(body).expect_err("should fail");
        assert!(matches!(err, QueryError::Parse { .. }), "got {err:?}");
    }

    #[rstest]
    fn object_body_is_malformed() {
        let err = parse_geocode_response(r#"{"error":"rate limited"}"#).expect_err("should fail");
        assert!(matches!(err, QueryError::MalformedResponse { .. }));
    }

    #[rstest]
    fn url_appends_to_existing_query_string() {
        let url = geocode_url("http://localhost/search?accept-language=en", "Berlin");
        assert_eq!(
            url,
            "http://localhost/search?accept-language=en&q=Berlin&format=json&limit=1"
        );
    }
}
