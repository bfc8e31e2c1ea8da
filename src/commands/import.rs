//! The import command: classify a raw export and merge it into the ledger.

use crate::commands::Out;
use crate::confirm::ConfirmationGate;
use crate::merge::{self, MergeState, Outcome};
use crate::model::Ledger;
use crate::transform::{read_raw, transform, SkippedRow};
use crate::{Config, Result};
use anyhow::bail;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What an import did.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    /// The terminal state of the run: `applied` or `aborted`.
    pub state: MergeState,
    /// Rows read from the raw export.
    pub rows_in: usize,
    /// Rows dropped because they were malformed or had a non-numeric amount.
    pub skipped: Vec<SkippedRow>,
    /// Transactions added to the ledger.
    pub appended: usize,
    /// Incoming transactions that were already in the ledger.
    pub duplicates: usize,
    /// Transactions in the ledger after the run.
    pub total: usize,
    /// Where the previous ledger was copied before it was overwritten.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
}

/// Classifies the transactions in the raw export at `raw_path` and merges them into the ledger.
///
/// When there is no ledger yet, all transactions become the new ledger. When some transactions
/// are already in the ledger, `gate` decides whether to append the rest or to stop without
/// writing anything. The ledger file is written at most once, after everything else succeeded.
///
/// # Errors
/// - The raw export cannot be read.
/// - The existing ledger cannot be read or lacks a required column.
/// - The raw export has rows but none of them could be used.
/// - The ledger cannot be written.
pub fn import(
    config: &Config,
    raw_path: &Path,
    gate: &mut dyn ConfirmationGate,
) -> Result<Out<ImportReport>> {
    let ledger_path = config.ledger_path();
    let classifier = config.classifier();

    let existing = Ledger::load(ledger_path)?;
    match &existing {
        Some(ledger) => info!(
            "Read {} existing record(s) from {}",
            ledger.len(),
            ledger_path.display()
        ),
        None => info!(
            "{} not found, it will be created from {}",
            ledger_path.display(),
            raw_path.display()
        ),
    }

    info!("Reading raw data from {}", raw_path.display());
    let rows = read_raw(raw_path)?;
    let transformed = transform(rows, &classifier);
    transformed.report();

    let rows_in = transformed.rows_in();
    let mut report = ImportReport {
        state: MergeState::Applied,
        rows_in,
        skipped: transformed.skipped,
        appended: 0,
        duplicates: 0,
        total: existing.as_ref().map(Ledger::len).unwrap_or_default(),
        backup: None,
    };

    if rows_in == 0 {
        report.state = MergeState::Aborted;
        return Ok(Out::new(
            format!(
                "{} contained no transactions, nothing to do",
                raw_path.display()
            ),
            report,
        ));
    }
    if transformed.transactions.is_empty() {
        bail!(
            "None of the {rows_in} row(s) in {} could be used, check the file format",
            raw_path.display()
        );
    }

    let had_ledger = existing.is_some();
    let outcome = merge::run(existing, transformed.transactions, gate)?;
    report.state = outcome.state();

    let message = match outcome {
        Outcome::Created { ledger } => {
            ledger.save(ledger_path)?;
            report.appended = ledger.len();
            report.total = ledger.len();
            format!(
                "Created {} with {} record(s)",
                ledger_path.display(),
                ledger.len()
            )
        }
        Outcome::Appended {
            ledger,
            appended,
            discarded,
        } => {
            report.appended = appended;
            report.duplicates = discarded;
            report.total = ledger.len();
            if appended == 0 {
                format!(
                    "Discarded {discarded} duplicate(s), no new records to append to {}",
                    ledger_path.display()
                )
            } else {
                if had_ledger {
                    report.backup = config.backup().copy_ledger()?;
                    if let Some(backup) = &report.backup {
                        debug!("Saved ledger backup to {}", backup.display());
                    }
                }
                ledger.save(ledger_path)?;
                format!(
                    "Appended {appended} new record(s) to {}, discarded {discarded} duplicate(s). \
                    Total records: {}",
                    ledger_path.display(),
                    ledger.len()
                )
            }
        }
        Outcome::Aborted { duplicates } => {
            report.duplicates = duplicates.len();
            format!(
                "Operation cancelled. No changes made to {}",
                ledger_path.display()
            )
        }
    };

    Ok(Out::new(message, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CashFlow;
    use crate::test::{ScriptedGate, TestEnv};

    const ACME_LEDGER: &str = "date,amount,description,vendors,cash_flow\n\
        2025-02-27,2000.00,PAYROLL,Other,cash_in\n\
        2025-03-01,-50.00,ACME STORE,Acme,cash_out\n";

    fn ledger(env: &TestEnv) -> Ledger {
        Ledger::load(env.ledger_path()).unwrap().unwrap()
    }

    #[test]
    fn test_first_run_creates_ledger_without_prompt() {
        let env = TestEnv::new();
        let raw = env.raw_export(
            "03/01/2025,-50.00,*,,ACME STORE\n\
            03/02/2025,-500.00,*,,VANGUARD BUY\n\
            03/03/2025,1500.00,*,,PAYROLL\n",
        );
        let mut gate = ScriptedGate::new([]);

        let out = import(&env.config(), &raw, &mut gate).unwrap();

        assert_eq!(gate.asked(), 0);
        let report = out.structure().unwrap();
        assert_eq!(report.state, MergeState::Applied);
        assert_eq!(report.appended, 3);
        let l = ledger(&env);
        assert_eq!(l.len(), 3);
        let flows: Vec<CashFlow> = l.transactions().iter().map(|t| t.cash_flow()).collect();
        assert_eq!(
            flows,
            vec![CashFlow::CashOut, CashFlow::CashInvestments, CashFlow::CashIn]
        );
        assert!(report.backup.is_none());
    }

    #[test]
    fn test_duplicate_confirmed_appends_one() {
        let env = TestEnv::new();
        std::fs::write(env.ledger_path(), ACME_LEDGER).unwrap();
        let raw = env.raw_export("2025-03-01,-50.00,*,,ACME STORE\n2025-03-04,-4.50,*,,COFFEE BAR\n");
        let mut gate = ScriptedGate::new([true]);

        let out = import(&env.config(), &raw, &mut gate).unwrap();

        assert_eq!(gate.asked(), 1);
        assert_eq!(gate.shown()[0].len(), 1);
        assert_eq!(gate.shown()[0][0].description(), "ACME STORE");
        let report = out.structure().unwrap();
        assert_eq!(report.appended, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.total, 3);
        assert!(report.backup.as_ref().unwrap().is_file());

        let l = ledger(&env);
        assert_eq!(l.len(), 3);
        let last = l.transactions().last().unwrap();
        assert_eq!(last.vendor(), "Coffee");
        assert_eq!(last.cash_flow(), CashFlow::CashOut);
    }

    #[test]
    fn test_duplicate_declined_leaves_ledger_untouched() {
        let env = TestEnv::new();
        std::fs::write(env.ledger_path(), ACME_LEDGER).unwrap();
        let before = env.ledger_bytes().unwrap();
        let raw = env.raw_export("2025-03-01,-50.00,*,,ACME STORE\n2025-03-04,-4.50,*,,COFFEE BAR\n");
        let mut gate = ScriptedGate::new([false]);

        let out = import(&env.config(), &raw, &mut gate).unwrap();

        assert_eq!(out.structure().unwrap().state, MergeState::Aborted);
        assert!(out.message().contains("No changes made"));
        assert_eq!(env.ledger_bytes().unwrap(), before);
    }

    #[test]
    fn test_non_numeric_amount_is_dropped_and_run_succeeds() {
        let env = TestEnv::new();
        let raw = env.raw_export("2025-03-01,abc,*,,ACME STORE\n2025-03-02,-3.00,*,,COFFEE\n");
        let mut gate = ScriptedGate::new([]);

        let out = import(&env.config(), &raw, &mut gate).unwrap();

        let report = out.structure().unwrap();
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].line, 1);
        assert_eq!(ledger(&env).len(), 1);
    }

    #[test]
    fn test_short_row_is_rejected_without_aborting() {
        let env = TestEnv::new();
        let raw = env.raw_export("2025-03-01,-1.00\n2025-03-02,-3.00,COFFEE\n");
        let mut gate = ScriptedGate::new([]);

        let out = import(&env.config(), &raw, &mut gate).unwrap();

        assert_eq!(out.structure().unwrap().skipped.len(), 1);
        let l = ledger(&env);
        assert_eq!(l.len(), 1);
        assert_eq!(l.transactions()[0].vendor(), "Coffee");
    }

    #[test]
    fn test_repeat_import_is_idempotent() {
        let env = TestEnv::new();
        let raw = env.raw_export("2025-03-01,-50.00,*,,ACME STORE\n2025-03-02,-3.00,*,,COFFEE\n");

        import(&env.config(), &raw, &mut ScriptedGate::new([])).unwrap();
        let first = env.ledger_bytes().unwrap();

        let out = import(&env.config(), &raw, &mut ScriptedGate::new([true])).unwrap();
        assert_eq!(out.structure().unwrap().appended, 0);
        assert_eq!(env.ledger_bytes().unwrap(), first);
    }

    #[test]
    fn test_comma_formatted_amount_is_stored_exactly_and_deduplicated() {
        let env = TestEnv::new();
        let raw = env.raw_export("03/01/2025,\"1,000.005\",*,,ACME STORE\n");

        import(&env.config(), &raw, &mut ScriptedGate::new([])).unwrap();
        let first = env.ledger_bytes().unwrap();
        let text = String::from_utf8(first.clone()).unwrap();
        assert!(text.contains("03/01/2025,1000.005,ACME STORE,Acme,cash_in"));

        let mut gate = ScriptedGate::new([true]);
        let out = import(&env.config(), &raw, &mut gate).unwrap();

        assert_eq!(gate.asked(), 1);
        let report = out.structure().unwrap();
        assert_eq!(report.appended, 0);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.total, 1);
        assert_eq!(env.ledger_bytes().unwrap(), first);
    }

    #[test]
    fn test_dollar_amount_is_stored_as_plain_number() {
        let env = TestEnv::new();
        let raw = env.raw_export("03/01/2025,\"-$1,250.00\",*,,ACME STORE\n");

        import(&env.config(), &raw, &mut ScriptedGate::new([])).unwrap();

        let text = String::from_utf8(env.ledger_bytes().unwrap()).unwrap();
        assert!(text.contains("03/01/2025,-1250.00,ACME STORE,Acme,cash_out"));
        assert_eq!(ledger(&env).transactions()[0].amount().to_string(), "-1250.00");
    }

    #[test]
    fn test_missing_raw_file_is_fatal() {
        let env = TestEnv::new();
        let missing = env.config().root().join("missing.csv");
        let err = import(&env.config(), &missing, &mut ScriptedGate::new([])).unwrap_err();
        assert!(err.to_string().contains("missing.csv"));
        assert!(env.ledger_bytes().is_none());
    }

    #[test]
    fn test_ledger_missing_column_is_fatal() {
        let env = TestEnv::new();
        std::fs::write(env.ledger_path(), "date,amount,description\n").unwrap();
        let before = env.ledger_bytes().unwrap();
        let raw = env.raw_export("2025-03-02,-3.00,*,,COFFEE\n");

        let err = import(&env.config(), &raw, &mut ScriptedGate::new([])).unwrap_err();

        assert!(err.to_string().contains("missing key column"));
        assert_eq!(env.ledger_bytes().unwrap(), before);
    }

    #[test]
    fn test_empty_raw_file_is_not_an_error() {
        let env = TestEnv::new();
        let raw = env.raw_export("");
        let out = import(&env.config(), &raw, &mut ScriptedGate::new([])).unwrap();
        assert!(out.message().contains("nothing to do"));
        assert!(env.ledger_bytes().is_none());
    }

    #[test]
    fn test_no_usable_rows_is_fatal() {
        let env = TestEnv::new();
        let raw = env.raw_export("2025-03-01,abc,*,,ACME\nonly,two\n");
        let err = import(&env.config(), &raw, &mut ScriptedGate::new([])).unwrap_err();
        assert!(err.to_string().contains("None of the 2 row(s)"));
        assert!(env.ledger_bytes().is_none());
    }
}
