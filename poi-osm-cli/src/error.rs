//! Error types emitted by the `poi-osm` CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use poi_osm_core::{CoordinateError, NamePreferenceError, QueryError};
use poi_osm_http::TransportBuildError;
use thiserror::Error;

/// Errors emitted by the `poi-osm` CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Long flag name of the missing option.
        field: &'static str,
        /// Environment variable that can supply it instead.
        env: &'static str,
    },
    /// Neither an address nor coordinates were supplied.
    #[error("either --address or both --lat and --lon must be provided")]
    MissingLocation,
    /// Both an address and coordinates were supplied.
    #[error("--address cannot be combined with --lat/--lon")]
    ConflictingLocation,
    /// The supplied coordinates are not a valid WGS84 position.
    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(#[from] CoordinateError),
    /// The `names` option is not a known preference.
    #[error(transparent)]
    InvalidNamePreference(#[from] NamePreferenceError),
    /// The log subscriber could not be installed.
    #[error("failed to initialise logging: {message}")]
    Logging {
        /// Diagnostic from the subscriber.
        message: String,
    },
    /// Constructing the HTTP transport failed.
    #[error("failed to build HTTP transport: {0}")]
    BuildTransport(#[from] TransportBuildError),
    /// The query pipeline failed; the message is reported verbatim.
    #[error(transparent)]
    Query(#[from] QueryError),
    /// Serialising an output envelope failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing an output envelope failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
