//! Log subscriber installation.
//!
//! Library crates emit through the `log` facade; the subscriber's
//! `tracing-log` bridge forwards those records to the stderr formatter.

use tracing_subscriber::filter::LevelFilter;

use crate::CliError;

/// Map the number of `-v` flags to a level, starting from warnings.
pub(crate) const fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the stderr subscriber for the process.
pub(crate) fn init(verbosity: u8) -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_max_level(level_for(verbosity))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|error| CliError::Logging {
            message: error.to_string(),
        })
}
