use std::process::ExitCode;

use clap::Parser;

mod cli;
mod config;
mod edit;
mod import;
mod library;
mod runtime;
mod store;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    match runtime::run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fermata: {e}");
            ExitCode::FAILURE
        }
    }
}
