use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::cli::{Cli, Command};
use crate::store::Store;

mod commands;
mod logging;
mod modify;
mod settings;

pub use modify::{ModifyReport, ModifyRequest, modify};

fn open_store(
    cli: &Cli,
    settings: &crate::config::Settings,
) -> Result<Store, Box<dyn std::error::Error>> {
    let path: PathBuf = cli
        .library
        .clone()
        .or_else(|| settings.database_path())
        .ok_or("no library database configured (set library.database or pass --library)")?;
    Ok(Store::open(&path)?)
}

pub fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let settings = settings::load_settings(cli.config.as_deref());
    logging::init(&settings.logging, cli.verbose);

    let mut out = io::stdout().lock();
    let mut err = io::stderr().lock();

    match &cli.command {
        Command::Config => {
            commands::show_config(&settings, &mut out)?;
        }
        Command::Import { dir } => {
            let mut store = open_store(&cli, &settings)?;
            commands::import(&mut store, dir, &settings, &mut out)?;
        }
        Command::List { kind, query } => {
            let store = open_store(&cli, &settings)?;
            commands::list(&store, kind.kind(), query, &settings, &mut out)?;
        }
        Command::Fields { kind } => {
            let store = open_store(&cli, &settings)?;
            commands::fields_of(&store, kind.kind(), &mut out)?;
        }
        Command::Modify {
            kind,
            create,
            pretend,
            args,
        } => {
            let mut store = open_store(&cli, &settings)?;
            let req = ModifyRequest {
                kind: kind.kind(),
                args,
                create_if_missing: *create || settings.edit.create_if_missing,
                pretend: *pretend,
            };
            let report = modify(&mut store, req, &mut out, &mut err)?;
            if !report.succeeded() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
