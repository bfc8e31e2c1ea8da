use crate::classify::normalize_text;
use crate::model::Transaction;
use rust_decimal::Decimal;
use std::fmt::{Display, Formatter};

/// The identity used to decide whether an incoming transaction was already recorded in the ledger.
///
/// Two transactions are duplicates if and only if their keys are equal. The parts are normalized
/// so that formatting differences between data sources do not hide a duplicate:
/// - `date` is trimmed.
/// - `amount` has trailing zeros stripped, so `12.50`, `12.5` and `12.500` are the same key.
/// - `description` goes through [`normalize_text`], the same normalization used for vendor
///   matching.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DuplicateKey {
    date: String,
    amount: Decimal,
    description: String,
}

impl DuplicateKey {
    pub fn new(date: &str, amount: Decimal, description: &str) -> Self {
        Self {
            date: date.trim().to_string(),
            amount: amount.normalize(),
            description: normalize_text(description),
        }
    }
}

impl From<&Transaction> for DuplicateKey {
    fn from(t: &Transaction) -> Self {
        DuplicateKey::new(t.date(), t.amount().normalized(), t.description())
    }
}

impl Display for DuplicateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}_{}", self.date, self.amount, self.description)
    }
}
