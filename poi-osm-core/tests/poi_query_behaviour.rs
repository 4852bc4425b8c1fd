#![expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]

//! Behavioural tests for the end-to-end query pipeline.
//!
//! Upstream services are replaced by [`StubTransport`], which replays canned
//! Nominatim and Overpass bodies and records the requests the client sent.

use std::cell::RefCell;

use poi_osm_core::test_support::{StubTransport, decode_overpass_form};
use poi_osm_core::{
    ClientConfig, ErrorEnvelope, GeoPoint, PoiClient, QueryError, QueryInput, ResultEnvelope,
    Whitelist, WhitelistEntry,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

const NOMINATIM_URL: &str = "http://nominatim.test/search";
const OVERPASS_URL: &str = "http://overpass.test/api/interpreter";
const ADDRESS: &str = "Marienplatz 1, München";
const MARIENPLATZ: GeoPoint = GeoPoint::new(48.137_43, 11.575_49);
const TIMEOUT_REMARK: &str =
    r#"runtime error: Query timed out in "query" at line 1 after 26 seconds."#;

/// World state for query scenarios.
#[derive(Debug, Default)]
struct QueryWorld {
    transport: RefCell<StubTransport>,
    outcome: RefCell<Option<Result<ResultEnvelope, QueryError>>>,
}

impl QueryWorld {
    fn queue_response(&self, body: &str) {
        self.transport.replace_with(|stub| std::mem::take(stub).with_response(body));
    }

    fn run(&self, input: &QueryInput, radius_m: u32, whitelist: &Whitelist) {
        let transport = self.transport.borrow();
        let config = ClientConfig::default()
            .with_nominatim_url(NOMINATIM_URL)
            .with_overpass_url(OVERPASS_URL);
        let client = PoiClient::with_config(&*transport, config);
        self.outcome.replace(Some(client.query(input, radius_m, whitelist)));
    }

    fn envelope(&self) -> ResultEnvelope {
        self.outcome
            .borrow()
            .clone()
            .expect("query should have run")
            .expect("query should succeed")
    }

    fn error(&self) -> QueryError {
        self.outcome
            .borrow()
            .clone()
            .expect("query should have run")
            .expect_err("query should fail")
    }
}

#[fixture]
fn world() -> QueryWorld {
    QueryWorld::default()
}

// --- Given steps ---

#[given("an Overpass service returning one named viewpoint")]
fn overpass_viewpoint(world: &QueryWorld) {
    world.queue_response(
        r#"{"version":0.6,"elements":[
            {"type":"node","id":1,"lat":48.1365,"lon":11.5759,
             "tags":{"tourism":"viewpoint","name":"Alter Peter"}}
        ]}"#,
    );
}

#[given("an Overpass service returning an unnamed restaurant")]
fn overpass_restaurant(world: &QueryWorld) {
    world.queue_response(
        r#"{"elements":[
            {"type":"node","id":2,"lat":48.1372,"lon":11.5755,"tags":{"amenity":"restaurant"}}
        ]}"#,
    );
}

#[given("an Overpass service returning a timeout remark")]
fn overpass_remark(world: &QueryWorld) {
    let body = serde_json::json!({ "version": 0.6, "remark": TIMEOUT_REMARK }).to_string();
    world.queue_response(&body);
}

#[given("an Overpass service returning an HTML error page")]
fn overpass_html(world: &QueryWorld) {
    world.queue_response(
        "<!DOCTYPE html>\n<html><head><title>504 Gateway Timeout</title></head></html>",
    );
}

#[given("a geocoder resolving the address to Marienplatz")]
fn geocoder_marienplatz(world: &QueryWorld) {
    world.queue_response(r#"[{"lat":"48.13743","lon":"11.57549","display_name":"Marienplatz"}]"#);
}

#[given("a geocoder returning no matches")]
fn geocoder_empty(world: &QueryWorld) {
    world.queue_response("[]");
}

#[given("a geocoder returning zero coordinates")]
fn geocoder_zero(world: &QueryWorld) {
    world.queue_response(r#"[{"lat":"0","lon":"0"}]"#);
}

// --- When steps ---

#[when("I query viewpoints near Marienplatz by coordinates")]
fn query_viewpoints(world: &QueryWorld) {
    let whitelist = Whitelist::from(vec![WhitelistEntry::key_value("tourism", "viewpoint")]);
    world.run(&QueryInput::Coordinates(MARIENPLATZ), 1000, &whitelist);
}

#[when("I query restaurants around the address")]
fn query_restaurants(world: &QueryWorld) {
    let whitelist = Whitelist::from(vec![WhitelistEntry::key_value("amenity", "restaurant")]);
    world.run(&QueryInput::Address(ADDRESS.to_owned()), 500, &whitelist);
}

// --- Then steps ---

#[then("the Overpass query filters viewpoints around Marienplatz")]
fn then_query_filters(world: &QueryWorld) {
    let requests = world.transport.borrow().requests();
    let overpass = requests.last().expect("an Overpass request");
    assert_eq!(overpass.url, OVERPASS_URL);
    let query = decode_overpass_form(overpass.body.as_deref().expect("form body"))
        .expect("decodable form body");
    assert!(
        query.contains(r#"node(around:1000,48.137430,11.575490)["tourism"="viewpoint"];"#),
        "unexpected query {query}"
    );
}

#[then("the envelope lists the named viewpoint")]
fn then_named_viewpoint(world: &QueryWorld) {
    let envelope = world.envelope();
    assert_eq!(envelope.schema_version, 1);
    assert_eq!(envelope.results.count, 1);
    let poi = &envelope.results.pois[0];
    assert_eq!(poi.name.as_deref(), Some("Alter Peter"));
    assert_eq!(
        poi.tags.get("tourism").map(String::as_str),
        Some("viewpoint")
    );
}

#[then("the envelope lists one POI without a name")]
fn then_unnamed(world: &QueryWorld) {
    let envelope = world.envelope();
    assert_eq!(envelope.results.count, 1);
    let json = serde_json::to_value(&envelope.results.pois[0]).expect("serialise POI");
    assert!(json["name"].is_null(), "name should be null, got {json}");
}

#[then("the envelope echoes the coordinate input")]
fn then_echo_coordinates(world: &QueryWorld) {
    let envelope = world.envelope();
    assert_eq!(envelope.query.input, QueryInput::Coordinates(MARIENPLATZ));
    assert_eq!(envelope.query.resolved_center, MARIENPLATZ);
    assert_eq!(envelope.query.radius_m, 1000);
    assert_eq!(envelope.source.provider, "OpenStreetMap");
    assert_eq!(envelope.source.geocoder, "Nominatim");
    assert_eq!(envelope.source.overpass_endpoint, OVERPASS_URL);
    assert_eq!(
        envelope.query.timestamp_utc.len(),
        "2026-01-01T00:00:00Z".len()
    );
    assert!(envelope.query.timestamp_utc.ends_with('Z'));
}

#[then("the envelope echoes the address input")]
fn then_echo_address(world: &QueryWorld) {
    let envelope = world.envelope();
    assert_eq!(
        envelope.query.input,
        QueryInput::Address(ADDRESS.to_owned())
    );
    assert_eq!(envelope.query.resolved_center, MARIENPLATZ);
}

#[then("the geocoder is asked for a single JSON match")]
fn then_geocoder_request(world: &QueryWorld) {
    let requests = world.transport.borrow().requests();
    let geocode = requests.first().expect("a geocoding request");
    assert_eq!(
        geocode.url,
        format!("{NOMINATIM_URL}?q=Marienplatz%201%2C%20M%C3%BCnchen&format=json&limit=1")
    );
    assert_eq!(geocode.body, None);
}

#[then("the query fails because the address was not found")]
fn then_not_found(world: &QueryWorld) {
    let error = world.error();
    assert_eq!(error, QueryError::EmptyResult);
    let envelope = ErrorEnvelope::new(error.to_string());
    assert_eq!(envelope.error, "no geocoding result for address");
}

#[then("the query fails because the coordinates are invalid")]
fn then_invalid_coordinates(world: &QueryWorld) {
    assert_eq!(
        world.error().to_string(),
        "parse error: invalid coordinates in geocoding response"
    );
}

#[then("the query fails with the upstream remark")]
fn then_upstream(world: &QueryWorld) {
    assert_eq!(
        world.error(),
        QueryError::Upstream {
            remark: TIMEOUT_REMARK.to_owned(),
        }
    );
}

#[then("the query fails because the service is overloaded")]
fn then_overloaded(world: &QueryWorld) {
    assert_eq!(world.error(), QueryError::ServiceOverloaded);
}

#[then("Overpass is never contacted")]
fn then_no_overpass(world: &QueryWorld) {
    let requests = world.transport.borrow().requests();
    assert!(requests.iter().all(|request| request.url != OVERPASS_URL));
}

// --- Scenario registrations ---

#[scenario(path = "tests/features/poi_query.feature", index = 0)]
fn viewpoints_by_coordinates(world: QueryWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/poi_query.feature", index = 1)]
fn restaurants_by_address(world: QueryWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/poi_query.feature", index = 2)]
fn address_not_found(world: QueryWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/poi_query.feature", index = 3)]
fn zero_sentinel(world: QueryWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/poi_query.feature", index = 4)]
fn upstream_remark(world: QueryWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/poi_query.feature", index = 5)]
fn html_error_page(world: QueryWorld) {
    let _ = world;
}
