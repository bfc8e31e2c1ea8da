use cashflow_ledger::args::{Args, Command};
use cashflow_ledger::{commands, AssumeYes, Config, ConfirmationGate, Result, TerminalGate};
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().home().path();

    let _: () = match args.command() {
        Command::Init => commands::init(home)?.print(),

        Command::Import(import_args) => {
            let config = Config::load(home)?;
            let mut gate: Box<dyn ConfirmationGate> = if import_args.yes() {
                Box::new(AssumeYes)
            } else {
                Box::new(TerminalGate)
            };
            commands::import(&config, import_args.file(), gate.as_mut())?.print()
        }

        Command::Summary => {
            let config = Config::load(home)?;
            commands::summary(&config)?.print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                "cashflow_ledger",
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
