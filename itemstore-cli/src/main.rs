//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use env_logger::{Builder, Env};
use itemstore_cli::CliError;
use log::error;

fn main() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    match itemstore_cli::run() {
        Ok(()) => {}
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            if err.is_fatal() {
                error!("aborting: {err}");
            }
            eprintln!("itemstore: {err}");
            std::process::exit(1);
        }
    }
}
