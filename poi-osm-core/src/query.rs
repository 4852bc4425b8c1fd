//! Overpass QL construction for radial node searches.
//!
//! The builder is pure: identical inputs always yield byte-identical query
//! strings. Center coordinates are written with exactly six decimals, which
//! is roughly 0.11 m at the equator and independent of any locale.

use crate::{GeoPoint, Whitelist, WhitelistEntry};

/// Server-side timeout requested in every query, in seconds.
pub const SERVER_TIMEOUT_SECS: u32 = 25;

/// Build the Overpass QL query for nodes within `radius_m` of `center`.
///
/// An empty whitelist yields one unconditional node clause; otherwise each
/// entry contributes one clause and the clauses form a union.
///
/// # Examples
/// ```
/// use poi_osm_core::{GeoPoint, Whitelist, WhitelistEntry, build_overpass_query};
///
/// let whitelist = Whitelist::from(vec![WhitelistEntry::key_value("tourism", "viewpoint")]);
/// let center = GeoPoint::new(48.137_43, 11.575_49);
/// let query = build_overpass_query(center, 1000, &whitelist);
/// assert_eq!(
///     query,
///     r#"[out:json][timeout:25];(node(around:1000,48.137430,11.575490)["tourism"="viewpoint"];);out center;"#
/// );
/// ```
#[must_use]
pub fn build_overpass_query(center: GeoPoint, radius_m: u32, whitelist: &Whitelist) -> String {
    let around = format!("around:{radius_m},{:.6},{:.6}", center.lat, center.lon);
    let clauses: String = if whitelist.is_empty() {
        format!("node({around});")
    } else {
        whitelist
            .iter()
            .map(|entry| format!("node({around}){};", tag_filter(entry)))
            .collect()
    };

    format!("[out:json][timeout:{SERVER_TIMEOUT_SECS}];({clauses});out center;")
}

fn tag_filter(entry: &WhitelistEntry) -> String {
    if entry.matches_any_value() {
        format!("[{}]", quote(&entry.key))
    } else {
        format!("[{}={}]", quote(&entry.key), quote(&entry.value))
    }
}

/// Wrap `raw` in double quotes, escaping characters that would end the
/// string literal or break the statement.
fn quote(raw: &str) -> String {
    let mut quoted = String::with_capacity(raw.len() + 2);
    quoted.push('"');
    for ch in raw.chars() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn empty_whitelist_yields_single_unconditional_clause() {
        let query = build_overpass_query(GeoPoint::new(1.5, -2.25), 100, &Whitelist::new());
        assert_eq!(
            query,
            "[out:json][timeout:25];(node(around:100,1.500000,-2.250000););out center;"
        );
    }

    #[rstest]
    fn one_clause_per_entry() {
        let whitelist = Whitelist::from(vec![
            WhitelistEntry::key("amenity"),
            WhitelistEntry::key_value("shop", "bakery"),
        ]);
        let query = build_overpass_query(GeoPoint::new(10.0, 20.0), 50, &whitelist);
        assert_eq!(
            query,
            concat!(
                "[out:json][timeout:25];(",
                r#"node(around:50,10.000000,20.000000)["amenity"];"#,
                r#"node(around:50,10.000000,20.000000)["shop"="bakery"];"#,
                ");out center;"
            )
        );
    }

    #[rstest]
    #[case("a\"b", r#""a\"b""#)]
    #[case(r"back\slash", r#""back\\slash""#)]
    #[case("line\nbreak", r#""line\nbreak""#)]
    #[case("tab\there", r#""tab\there""#)]
    #[case("plain", r#""plain""#)]
    fn quote_escapes_string_breakers(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(quote(raw), expected);
    }

    #[rstest]
    fn injected_statement_stays_inside_the_literal() {
        let whitelist = Whitelist::from(vec![WhitelistEntry::key_value(
            "name",
            r#"x"];way(around:1,0,0);(node["a"#,
        )]);
        let query = build_overpass_query(GeoPoint::new(1.0, 1.0), 10, &whitelist);
        assert_eq!(query.matches("node(").count(), 1);
        assert!(query.contains(r#"["name"="x\"];way(around:1,0,0);(node[\"a"]"#));
    }
}
