//! `cashflow-ledger` classifies the rows of a bank transaction export by vendor and cash-flow
//! direction and merges them into a persisted CSV ledger without duplicating transactions that
//! were imported before.
//!
//! The pipeline is: [`Config`] → [`transform`] (using a [`Classifier`]) → [`DuplicateKey`] →
//! [`merge`] → (when duplicates exist) a [`ConfirmationGate`] → [`Ledger::save`].

pub mod args;
mod backup;
mod classify;
pub mod commands;
mod config;
mod confirm;
mod error;
pub mod merge;
pub mod model;
mod transform;
mod utils;


pub use backup::Backup;
pub use classify::{normalize_text, Classifier};
pub use config::{Config, VendorPatterns};
pub use confirm::{AssumeYes, ConfirmationGate, TerminalGate};
pub use error::{Error, Result};
pub use merge::{merge, MergeDecision, MergeResult, MergeState, Outcome};
pub use model::{Amount, CashFlow, DuplicateKey, Ledger, RawRecord, Transaction};
pub use transform::{read_raw, transform, SkipReason, SkippedRow, Transformed};
