//! `supplementctl`: command-line adapter over the supplement service.
//!
//! # Responsibility
//! - Wire configuration (flags/env) to a store backend and the service.
//! - Report results on stdout, errors on stderr with a kind-specific exit code.

mod args;
mod commands;

use args::{Backend, Cli};
use clap::Parser;
use commands::{execute, CliError};
use log::{error, info};
use std::process::ExitCode;
use supplement_core::db::open_db;
use supplement_core::{
    default_log_level, init_logging, DocumentSupplementRepository, SqliteSupplementRepository,
    SupplementService,
};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(Some(output)) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(err) => {
            error!(
                "event=cli_command module=cli status=error exit_code={} error={err}",
                err.exit_code()
            );
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<Option<String>, CliError> {
    // clap rejects a log level without a log dir.
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }
    info!(
        "event=cli_command module=cli status=start backend={:?} store={}",
        cli.backend,
        cli.store.display()
    );

    match cli.backend {
        Backend::Sqlite => {
            let conn = open_db(&cli.store)?;
            let service = SupplementService::new(SqliteSupplementRepository::new(&conn));
            execute(&service, cli.command)
        }
        Backend::Document => {
            let service = SupplementService::new(DocumentSupplementRepository::new(cli.store));
            execute(&service, cli.command)
        }
    }
}
