//! The point where a run stops and asks whether to go ahead when duplicates were found.

use crate::model::Transaction;
use crate::Result;
use console::Term;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use tracing::info;

/// Decides whether a merge that found duplicates should go ahead. Returning `true` appends only
/// the unique transactions and discards `duplicates`; returning `false` aborts the run without
/// writing anything.
pub trait ConfirmationGate {
    fn confirm(&mut self, duplicates: &[Transaction]) -> Result<bool>;
}

/// Lists the duplicates on the terminal and asks the user. Blocks until an answer is given.
#[derive(Debug, Default)]
pub struct TerminalGate;

impl ConfirmationGate for TerminalGate {
    fn confirm(&mut self, duplicates: &[Transaction]) -> Result<bool> {
        let term = Term::stderr();
        term.write_line("")?;
        term.write_line("--- Duplicate Transactions Found ---")?;
        term.write_line(&format!(
            "{} transaction(s) in the new data match existing records:",
            duplicates.len()
        ))?;
        for t in duplicates {
            term.write_line(&format!(
                "  {}  {:>12}  {}",
                t.date(),
                t.amount().to_string(),
                t.description()
            ))?;
        }
        term.write_line("------------------------------------")?;

        let proceed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Proceed and append only the unique new records?")
            .default(false)
            .interact_on(&term)?;
        Ok(proceed)
    }
}

/// Always goes ahead. Used for `--yes`.
#[derive(Debug, Default)]
pub struct AssumeYes;

impl ConfirmationGate for AssumeYes {
    fn confirm(&mut self, duplicates: &[Transaction]) -> Result<bool> {
        info!(
            "Discarding {} duplicate transaction(s) without asking",
            duplicates.len()
        );
        Ok(true)
    }
}
