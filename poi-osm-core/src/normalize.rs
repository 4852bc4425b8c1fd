//! Turn an Overpass response body into a [`ResultEnvelope`].
//!
//! Overpass reports failures in several shapes: a JSON object carrying a
//! `remark` instead of `elements`, or an HTML error page served with a
//! success status. Both are mapped onto [`QueryError`] variants here.
//!
//! The whitelist is applied again on the client even though the query
//! already filtered on the server. The client-side check is the contract;
//! the server-side filter only narrows the transfer.

use std::str::FromStr;

use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::{Poi, QueryEcho, QueryError, ResultEnvelope, Results, SCHEMA_VERSION, Source, Tags};

/// Which tag supplies [`Poi::name`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NamePreference {
    /// The `name` tag only.
    #[default]
    Native,
    /// `name:en` when present, otherwise `name`.
    English,
}

/// Error returned when parsing a [`NamePreference`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown name preference {raw:?} (expected `native` or `english`)")]
pub struct NamePreferenceError {
    /// The rejected text.
    pub raw: String,
}

impl FromStr for NamePreference {
    type Err = NamePreferenceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "native" => Ok(Self::Native),
            "english" | "en" => Ok(Self::English),
            _ => Err(NamePreferenceError {
                raw: raw.to_owned(),
            }),
        }
    }
}

impl NamePreference {
    /// Pick the display name from `tags`.
    #[must_use]
    pub fn pick(self, tags: &Tags) -> Option<String> {
        let english = match self {
            Self::Native => None,
            Self::English => tags.get("name:en"),
        };
        english.or_else(|| tags.get("name")).cloned()
    }
}

#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(default)]
    lat: f64,
    #[serde(default)]
    lon: f64,
    #[serde(default)]
    tags: Tags,
}

impl RawNode {
    fn into_poi(self, names: NamePreference) -> Poi {
        Poi {
            lat: self.lat,
            lon: self.lon,
            name: names.pick(&self.tags),
            tags: self.tags,
        }
    }
}

/// Parse `raw_body`, keep accepted nodes, and assemble the envelope.
///
/// `query.whitelist` drives the client-side filter; `query` and `source`
/// are moved into the envelope unchanged.
///
/// # Errors
///
/// - [`QueryError::ServiceOverloaded`] when the body is an HTML page.
/// - [`QueryError::Parse`] when the body is not JSON.
/// - [`QueryError::Upstream`] when Overpass answered with a `remark` only.
/// - [`QueryError::MalformedResponse`] when `elements` is missing or not an
///   array, or a node cannot be decoded.
pub fn normalize(
    raw_body: &str,
    query: QueryEcho,
    source: Source,
    names: NamePreference,
) -> Result<ResultEnvelope, QueryError> {
    let elements = extract_elements(raw_body)?;
    let total = elements.len();

    let mut pois = Vec::new();
    for element in elements {
        if element.get("type").and_then(Value::as_str) != Some("node") {
            continue;
        }
        let node: RawNode = serde_json::from_value(element)
            .map_err(|err| QueryError::malformed(format!("unreadable node element: {err}")))?;
        if query.whitelist.accepts(&node.tags) {
            pois.push(node.into_poi(names));
        }
    }
    debug!("accepted {} of {total} Overpass elements", pois.len());

    Ok(ResultEnvelope {
        schema_version: SCHEMA_VERSION,
        source,
        query,
        results: Results::from(pois),
    })
}

fn extract_elements(raw_body: &str) -> Result<Vec<Value>, QueryError> {
    let value: Value = match serde_json::from_str(raw_body) {
        Ok(value) => value,
        Err(_) if looks_like_html(raw_body) => return Err(QueryError::ServiceOverloaded),
        Err(err) => {
            return Err(QueryError::parse(format!("invalid Overpass JSON: {err}")));
        }
    };

    let Value::Object(mut object) = value else {
        return Err(missing_elements(raw_body));
    };
    match (object.remove("elements"), object.remove("remark")) {
        (Some(Value::Array(elements)), Some(note)) => {
            warn!(
                "Overpass returned elements with remark: {}",
                remark_text(note)
            );
            Ok(elements)
        }
        (Some(Value::Array(elements)), None) => Ok(elements),
        (Some(_), _) => Err(QueryError::malformed("Overpass `elements` is not an array")),
        (None, Some(note)) => Err(QueryError::Upstream {
            remark: remark_text(note),
        }),
        (None, None) => Err(missing_elements(raw_body)),
    }
}

fn missing_elements(raw_body: &str) -> QueryError {
    if looks_like_html(raw_body) {
        QueryError::ServiceOverloaded
    } else {
        QueryError::malformed("Overpass response has no `elements`")
    }
}

fn remark_text(remark: Value) -> String {
    match remark {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

fn looks_like_html(body: &str) -> bool {
    body.as_bytes()
        .windows(5)
        .any(|window| window.eq_ignore_ascii_case(b"<html"))
}
