//! Query command implementation for the `poi-osm` CLI.

use std::io::Write;
use std::time::Duration;

use clap::Parser;
use log::{info, warn};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use poi_osm_core::{
    ClientConfig, DEFAULT_RADIUS_M, GeoPoint, NamePreference, PoiClient, QueryInput, Transport,
    Whitelist, WhitelistEntry,
};
use poi_osm_http::{HttpTransport, HttpTransportConfig};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_ADDRESS, ARG_LAT, ARG_LON, ARG_NAMES, ARG_NOMINATIM_URL, ARG_OVERPASS_URL, ARG_RADIUS,
    ARG_TIMEOUT_SECS, ARG_USER_AGENT, ARG_WHITELIST, CliError, ENV_LAT, ENV_LON, write_json,
};

/// CLI arguments for the `query` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "query",
    long_about = "Find OpenStreetMap points of interest around an address or \
                 a coordinate pair. Addresses are resolved through Nominatim; \
                 POIs are fetched from Overpass and printed as a versioned \
                 JSON envelope. Options can come from CLI flags, \
                 configuration files, or environment variables.",
    about = "Query POIs around a location"
)]
#[ortho_config(prefix = "POI_OSM")]
pub(crate) struct QueryArgs {
    /// Latitude of the search center in decimal degrees.
    #[arg(short = 'l', long = ARG_LAT, value_name = "deg", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Longitude of the search center in decimal degrees.
    #[arg(short = 'L', long = ARG_LON, value_name = "deg", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lon: Option<f64>,
    /// Free-form address to geocode.
    #[arg(short = 'a', long = ARG_ADDRESS, value_name = "text")]
    #[serde(default)]
    pub(crate) address: Option<String>,
    /// Search radius in meters (default 100000).
    #[arg(short = 'r', long = ARG_RADIUS, value_name = "m")]
    #[serde(default)]
    pub(crate) radius: Option<u32>,
    /// Tag filter as `key` or `key=value`; repeat to widen the search.
    #[arg(short = 'w', long = ARG_WHITELIST, value_name = "k[=v]")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) whitelist: Vec<String>,
    /// Name source: `native` uses `name`, `english` prefers `name:en`.
    #[arg(long = ARG_NAMES, value_name = "native|english")]
    #[serde(default)]
    pub(crate) names: Option<String>,
    /// Nominatim search endpoint.
    #[arg(long = ARG_NOMINATIM_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) nominatim_url: Option<String>,
    /// Overpass interpreter endpoint.
    #[arg(long = ARG_OVERPASS_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) overpass_url: Option<String>,
    /// User-Agent sent to both services.
    #[arg(long = ARG_USER_AGENT, value_name = "text")]
    #[serde(default)]
    pub(crate) user_agent: Option<String>,
    /// Abort each HTTP request after this many seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
}

impl QueryArgs {
    pub(crate) fn into_config(self) -> Result<QueryConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        QueryConfig::try_from(merged)
    }
}

/// Resolved `query` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QueryConfig {
    /// Address or coordinates to search around.
    pub(crate) input: QueryInput,
    /// Search radius in meters.
    pub(crate) radius_m: u32,
    /// Tag filters.
    pub(crate) whitelist: Whitelist,
    /// Upstream endpoints and name preference.
    pub(crate) client: ClientConfig,
    /// HTTP headers and timeout.
    pub(crate) transport: HttpTransportConfig,
}

impl TryFrom<QueryArgs> for QueryConfig {
    type Error = CliError;

    fn try_from(args: QueryArgs) -> Result<Self, Self::Error> {
        let input = resolve_input(args.address, args.lat, args.lon)?;

        let mut client = ClientConfig::default();
        if let Some(url) = args.nominatim_url {
            client = client.with_nominatim_url(url);
        }
        if let Some(url) = args.overpass_url {
            client = client.with_overpass_url(url);
        }
        if let Some(raw) = args.names {
            client = client.with_names(raw.parse::<NamePreference>()?);
        }

        let mut transport = HttpTransportConfig::new();
        if let Some(user_agent) = args.user_agent {
            transport = transport.with_user_agent(user_agent);
        }
        if let Some(secs) = args.timeout_secs {
            transport = transport.with_timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            input,
            radius_m: args.radius.unwrap_or(DEFAULT_RADIUS_M),
            whitelist: parse_whitelist(&args.whitelist),
            client,
            transport,
        })
    }
}

fn resolve_input(
    address: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
) -> Result<QueryInput, CliError> {
    match (address, lat, lon) {
        (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(CliError::ConflictingLocation),
        (Some(address), None, None) => Ok(QueryInput::Address(address)),
        (None, Some(lat), Some(lon)) => {
            let center = GeoPoint::new(lat, lon);
            center.validate()?;
            Ok(QueryInput::Coordinates(center))
        }
        (None, Some(_), None) => Err(CliError::MissingArgument {
            field: ARG_LON,
            env: ENV_LON,
        }),
        (None, None, Some(_)) => Err(CliError::MissingArgument {
            field: ARG_LAT,
            env: ENV_LAT,
        }),
        (None, None, None) => Err(CliError::MissingLocation),
    }
}

/// Parse whitelist arguments, skipping entries without a key.
pub(crate) fn parse_whitelist(raw: &[String]) -> Whitelist {
    raw.iter()
        .filter_map(|item| match item.parse::<WhitelistEntry>() {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("skipping {err}");
                None
            }
        })
        .collect()
}

/// Builds the transport for the current query invocation.
pub(super) trait QueryTransportBuilder {
    fn build(&self, config: &HttpTransportConfig) -> Result<Box<dyn Transport>, CliError>;
}

pub(super) struct DefaultQueryTransportBuilder;

impl QueryTransportBuilder for DefaultQueryTransportBuilder {
    fn build(&self, config: &HttpTransportConfig) -> Result<Box<dyn Transport>, CliError> {
        let transport = HttpTransport::with_config(config.clone())?;
        Ok(Box::new(transport))
    }
}

pub(super) fn run_query(args: QueryArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    let builder = DefaultQueryTransportBuilder;
    run_query_with(args, &builder, &mut stdout)
}

pub(super) fn run_query_with(
    args: QueryArgs,
    builder: &dyn QueryTransportBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let transport = builder.build(&config.transport)?;
    let client = PoiClient::with_config(transport, config.client);
    let envelope = client.query(&config.input, config.radius_m, &config.whitelist)?;
    info!("found {} POIs", envelope.results.count);
    write_json(writer, &envelope)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<QueryConfig, CliError> {
    let merged = QueryArgs::merge_from_layers(layers).map_err(CliError::from)?;
    QueryConfig::try_from(merged)
}
