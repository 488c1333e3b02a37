mod county;
mod error;
mod field;
mod operation;
mod store;

use clap::{error::ErrorKind, Parser};
use error::Error;
use log::debug;
use std::{path::PathBuf, process::ExitCode};
use store::CountyStore;

/// Filter and aggregate county demographics with a script of operations.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// Demographics CSV, one county per row after the header
    demographics: PathBuf,
    /// Operations file, one operation per line
    operations: PathBuf,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!("{err:?}");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Error> {
    let cli = cli()?;

    let counties = county::load(&cli.demographics)?;
    if counties.is_empty() {
        return Err(Error::NoEntries {
            path: cli.demographics,
        });
    }
    println!(
        "Successfully loaded {} entries from the demographics file.",
        counties.len()
    );

    let mut store = CountyStore::new(counties);
    operation::process_operations(&cli.operations, &mut store)
}

fn cli() -> Result<Cli, Error> {
    Cli::try_parse().map_err(|err| match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
        _ => Error::Usage(err.render().to_string()),
    })
}
