//! Merges newly classified transactions into the ledger without duplicating ones that were
//! already recorded.
//!
//! [`merge`] only partitions the incoming transactions. [`run`] drives one import through the
//! [`MergeState`] machine, asking a [`ConfirmationGate`] when duplicates were found, and returns
//! the ledger that should be written. Nothing in this module touches the filesystem.

use crate::confirm::ConfirmationGate;
use crate::model::{Ledger, Transaction};
use crate::Result;
use anyhow::bail;
use serde::Serialize;
use tracing::{debug, trace};

/// The states one import run moves through.
///
/// ```text
/// Start ─┬─> LoadedExisting ──> Partitioned ─┬─(no duplicates)──────────────> Applied
///        │                                   └─> AwaitingConfirmation ─┬─(yes)─> Applied
///        │                                                             └─(no)──> Aborted
///        └─> NoExisting ──────────────────────────────────────────────────────> Applied
/// ```
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeState {
    Start,
    LoadedExisting,
    NoExisting,
    Partitioned,
    AwaitingConfirmation,
    Applied,
    Aborted,
}

serde_plain::derive_display_from_serialize!(MergeState);

impl MergeState {
    pub fn is_terminal(self) -> bool {
        matches!(self, MergeState::Applied | MergeState::Aborted)
    }

    /// Whether the machine may move from `self` to `next`.
    pub fn can_advance_to(self, next: MergeState) -> bool {
        use MergeState::*;
        matches!(
            (self, next),
            (Start, LoadedExisting)
                | (Start, NoExisting)
                | (LoadedExisting, Partitioned)
                | (Partitioned, Applied)
                | (Partitioned, AwaitingConfirmation)
                | (AwaitingConfirmation, Applied)
                | (AwaitingConfirmation, Aborted)
                | (NoExisting, Applied)
        )
    }
}

/// Tracks the current state of a run and refuses transitions the machine does not have.
#[derive(Debug)]
struct Machine {
    state: MergeState,
}

impl Machine {
    fn new() -> Self {
        Self {
            state: MergeState::Start,
        }
    }

    fn advance(&mut self, next: MergeState) -> Result<()> {
        if !self.state.can_advance_to(next) {
            bail!("Invalid merge state transition from {} to {next}", self.state);
        }
        trace!("Merge state {} -> {next}", self.state);
        self.state = next;
        Ok(())
    }
}

/// What should happen to a partitioned batch.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeDecision {
    /// Nothing in the batch was seen before; append it all.
    AutoAppend,
    /// Some of the batch was seen before; ask before appending the rest.
    NeedsConfirmation,
}

/// The incoming transactions, split by whether the ledger already has them.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MergeResult {
    /// Transactions whose key is not in the ledger, in input order.
    pub unique: Vec<Transaction>,
    /// Transactions whose key is already in the ledger, in input order.
    pub duplicates: Vec<Transaction>,
    pub decision: MergeDecision,
}

/// Partitions `incoming` against the keys of `existing`. Only duplicates of ledger entries are
/// detected; repeated transactions within `incoming` itself are all kept.
pub fn merge(existing: &Ledger, incoming: Vec<Transaction>) -> MergeResult {
    let keys = existing.keys();
    let (duplicates, unique): (Vec<_>, Vec<_>) =
        incoming.into_iter().partition(|t| keys.contains(&t.key()));
    let decision = if duplicates.is_empty() {
        MergeDecision::AutoAppend
    } else {
        MergeDecision::NeedsConfirmation
    };
    MergeResult {
        unique,
        duplicates,
        decision,
    }
}

/// How a run ended.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Outcome {
    /// There was no ledger; `ledger` is the whole incoming batch.
    Created { ledger: Ledger },
    /// `appended` transactions were added to the existing ledger and `discarded` duplicates were
    /// dropped.
    Appended {
        ledger: Ledger,
        appended: usize,
        discarded: usize,
    },
    /// The user declined; the existing ledger must be left as it is.
    Aborted { duplicates: Vec<Transaction> },
}

impl Outcome {
    /// The terminal state the run ended in.
    pub fn state(&self) -> MergeState {
        match self {
            Outcome::Created { .. } | Outcome::Appended { .. } => MergeState::Applied,
            Outcome::Aborted { .. } => MergeState::Aborted,
        }
    }

    /// The ledger to persist, if any.
    pub fn ledger(&self) -> Option<&Ledger> {
        match self {
            Outcome::Created { ledger } | Outcome::Appended { ledger, .. } => Some(ledger),
            Outcome::Aborted { .. } => None,
        }
    }
}

/// Runs one import. `existing` is `None` when there is no ledger yet. `gate` is asked only when
/// duplicates were found.
///
/// # Errors
/// - The gate fails to produce an answer (e.g. the terminal is not interactive).
pub fn run(
    existing: Option<Ledger>,
    incoming: Vec<Transaction>,
    gate: &mut dyn ConfirmationGate,
) -> Result<Outcome> {
    let mut machine = Machine::new();

    let mut ledger = match existing {
        None => {
            machine.advance(MergeState::NoExisting)?;
            machine.advance(MergeState::Applied)?;
            debug!("Creating a new ledger with {} record(s)", incoming.len());
            return Ok(Outcome::Created {
                ledger: Ledger::new(incoming),
            });
        }
        Some(ledger) => {
            machine.advance(MergeState::LoadedExisting)?;
            ledger
        }
    };

    let result = merge(&ledger, incoming);
    machine.advance(MergeState::Partitioned)?;
    debug!(
        "Partitioned incoming transactions: {} unique, {} duplicate",
        result.unique.len(),
        result.duplicates.len()
    );

    if result.decision == MergeDecision::NeedsConfirmation {
        machine.advance(MergeState::AwaitingConfirmation)?;
        if !gate.confirm(&result.duplicates)? {
            machine.advance(MergeState::Aborted)?;
            return Ok(Outcome::Aborted {
                duplicates: result.duplicates,
            });
        }
    }

    machine.advance(MergeState::Applied)?;
    let appended = result.unique.len();
    let discarded = result.duplicates.len();
    ledger.extend(result.unique);
    Ok(Outcome::Appended {
        ledger,
        appended,
        discarded,
    })
}
