//! Command-line interface for querying OpenStreetMap points of interest.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{ArgAction, Parser, Subcommand};
use poi_osm_core::ErrorEnvelope;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

mod error;
mod logging;
mod query;

pub use error::CliError;

use query::{QueryArgs, run_query};

const ARG_LAT: &str = "lat";
const ARG_LON: &str = "lon";
const ARG_ADDRESS: &str = "address";
const ARG_RADIUS: &str = "radius";
const ARG_WHITELIST: &str = "whitelist";
const ARG_NAMES: &str = "names";
const ARG_NOMINATIM_URL: &str = "nominatim-url";
const ARG_OVERPASS_URL: &str = "overpass-url";
const ARG_USER_AGENT: &str = "user-agent";
const ARG_TIMEOUT_SECS: &str = "timeout-secs";
const ENV_LAT: &str = "POI_OSM_CMDS_QUERY_LAT";
const ENV_LON: &str = "POI_OSM_CMDS_QUERY_LON";

/// Indentation used for every JSON document the CLI prints.
const JSON_INDENT: &[u8] = b"    ";

/// Run the CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse()?;
    logging::init(cli.verbose)?;
    match cli.command {
        Command::Query(args) => run_query(args),
    }
}

/// Print `err` as a versioned error envelope.
///
/// # Errors
///
/// Returns [`CliError::SerialiseOutput`] or [`CliError::WriteOutput`] when
/// the envelope cannot be written.
pub fn write_error_envelope(writer: &mut dyn Write, err: &CliError) -> Result<(), CliError> {
    write_json(writer, &ErrorEnvelope::new(err.to_string()))
}

/// Write `value` as four-space indented JSON followed by a newline.
fn write_json<T: Serialize>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let mut payload = Vec::new();
    let formatter = PrettyFormatter::with_indent(JSON_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut payload, formatter);
    value
        .serialize(&mut serializer)
        .map_err(CliError::SerialiseOutput)?;
    payload.push(b'\n');
    writer.write_all(&payload).map_err(CliError::WriteOutput)?;
    writer.flush().map_err(CliError::WriteOutput)
}

#[derive(Debug, Parser)]
#[command(
    name = "poi-osm",
    about = "Query OpenStreetMap points of interest via Nominatim and Overpass",
    version
)]
struct Cli {
    /// Increase log verbosity (repeat for more detail).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Find POIs around an address or coordinates.
    Query(QueryArgs),
}

#[cfg(test)]
mod tests;
