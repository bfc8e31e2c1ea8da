//! These structs provide the CLI interface for the cashflow CLI.

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// cashflow: Keep a deduplicated, classified ledger of your bank transactions.
///
/// Each time you download a CSV export from your bank, import it. Every transaction is assigned a
/// vendor and a cash-flow class (cash_in, cash_out or cash_investments) using the patterns in your
/// config file, then appended to processed_transactions.csv in your cashflow home. Transactions
/// that are already in the ledger are shown to you before anything is written.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the cashflow home directory and a starter config file.
    ///
    /// Edit config.json afterwards: `patterns_wf` maps each vendor to the description fragments
    /// that identify it, and `cash_investments` lists the vendors whose payments are investments
    /// rather than spending.
    Init,
    /// Classify a raw bank export and merge it into the ledger.
    Import(ImportArgs),
    /// Show cash-flow totals, overall and per vendor, for the whole ledger.
    Summary,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG. See the tracing-subscriber crate for instructions.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the ledger and configuration are held. Defaults to ~/cashflow
    #[arg(long, env = "CASHFLOW_HOME", default_value_t = default_cashflow_home())]
    home: DisplayPath,
}

impl Common {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }
}

/// (Not shown): Args for the `cashflow import` command.
#[derive(Debug, Parser, Clone)]
pub struct ImportArgs {
    /// The raw CSV export downloaded from the bank. It has no header row; the date is the first
    /// column, the amount the second and the description the fifth (or the third for short rows).
    file: PathBuf,

    /// Append the unique records without asking when some records are already in the ledger.
    #[arg(long, short = 'y')]
    yes: bool,
}

impl ImportArgs {
    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn yes(&self) -> bool {
        self.yes
    }
}

fn default_cashflow_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("cashflow"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or CASHFLOW_HOME instead of relying on the default \
                cashflow home directory. If you continue using the program right now, you may \
                have problems!",
            );
            PathBuf::from("cashflow")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
