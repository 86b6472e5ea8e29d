//! storedesk - menu-driven record maintenance over a relational or a
//! document store.
//!
//! # Usage
//!
//! ```bash
//! # Relational backend, default database file
//! storedesk
//!
//! # Document backend with an explicit file and logs
//! storedesk --backend document --db ./docs.sqlite3 --log-dir /var/log/storedesk
//! ```
//!
//! Flags override `STOREDESK_*` environment variables and `.env` values.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::Parser;
use log::error;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use storedesk_core::{
    init_logging, open_store, AppConfig, BackendKind, LoggingConfig, RecordService,
};

mod menu;

#[derive(Parser, Debug)]
#[command(name = "storedesk")]
#[command(author, version, about = "Maintain users, products and addresses")]
struct Cli {
    /// Storage backend: relational or document
    #[arg(short = 'b', long = "backend")]
    backend: Option<BackendKind>,

    /// Database file of the selected backend
    #[arg(long = "db")]
    db: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long = "log-level")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files
    #[arg(long = "log-dir")]
    log_dir: Option<PathBuf>,

    /// Env file to load instead of `./.env`
    #[arg(long = "env-file")]
    env_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("storedesk: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let mut config = match &cli.env_file {
        Some(path) => AppConfig::from_env_file(path),
        None => AppConfig::from_env(),
    }
    .map_err(|err| err.to_string())?;

    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(db) = cli.db {
        match config.backend {
            BackendKind::Relational => config.relational_db = db,
            BackendKind::Document => config.document_db = db,
        }
    }

    if let Some(log_dir) = cli.log_dir.or_else(|| config.log_dir.clone()) {
        let level = cli.log_level.as_deref().unwrap_or(config.log_level);
        let logging = LoggingConfig::new(level, log_dir).map_err(|err| err.to_string())?;
        init_logging(&logging).map_err(|err| err.to_string())?;
    }

    let store = open_store(config.backend, config.database_path()).map_err(|err| {
        error!(
            "event=store_open module=cli status=error backend={} error_code={}",
            config.backend,
            err.code()
        );
        format!(
            "cannot open {} store at `{}`: {err}",
            config.backend,
            config.database_path().display()
        )
    })?;
    let mut service = RecordService::new(store);

    let stdin = io::stdin();
    menu::Menu::new(&mut service, stdin.lock(), io::stdout())
        .run()
        .map_err(|err| format!("terminal i/o failed: {err}"))
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::Parser;
    use storedesk_core::BackendKind;

    #[test]
    fn backend_flag_accepts_aliases() {
        let cli = Cli::try_parse_from(["storedesk", "--backend", "nosql"]).unwrap();
        assert_eq!(cli.backend, Some(BackendKind::Document));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert!(Cli::try_parse_from(["storedesk", "--backend", "graph"]).is_err());
    }
}
