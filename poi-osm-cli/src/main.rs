//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use std::process::ExitCode;

use poi_osm_cli::{CliError, run, write_error_envelope};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            let mut stderr = std::io::stderr().lock();
            if let Err(write_err) = write_error_envelope(&mut stderr, &err) {
                eprintln!("poi-osm: {err} ({write_err})");
            }
            ExitCode::FAILURE
        }
    }
}
