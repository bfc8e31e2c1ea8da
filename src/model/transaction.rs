use crate::model::{Amount, DuplicateKey};
use serde::{Deserialize, Serialize};

/// The vendor label given to a transaction whose description matches no configured pattern.
pub const UNKNOWN_VENDOR: &str = "Other";

/// The direction of a transaction's cash flow.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashFlow {
    /// Money entering the account. Zero amounts are also counted here.
    CashIn,
    /// Money leaving the account to a vendor that is not an investment vendor.
    CashOut,
    /// Money leaving the account to one of the configured investment vendors.
    CashInvestments,
}

serde_plain::derive_display_from_serialize!(CashFlow);
serde_plain::derive_fromstr_from_deserialize!(CashFlow);

/// A classified transaction, i.e. a single row of the ledger.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Transaction {
    pub(crate) date: String,
    pub(crate) amount: Amount,
    pub(crate) description: String,
    #[serde(rename = "vendors")]
    pub(crate) vendor: String,
    pub(crate) cash_flow: CashFlow,
}

impl Transaction {
    pub fn new(
        date: impl Into<String>,
        amount: Amount,
        description: impl Into<String>,
        vendor: impl Into<String>,
        cash_flow: CashFlow,
    ) -> Self {
        let vendor = vendor.into();
        Self {
            date: date.into(),
            amount,
            description: description.into(),
            vendor: if vendor.is_empty() {
                UNKNOWN_VENDOR.to_string()
            } else {
                vendor
            },
            cash_flow,
        }
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn cash_flow(&self) -> CashFlow {
        self.cash_flow
    }

    /// The key used to recognize this transaction when it shows up again in a later export.
    pub fn key(&self) -> DuplicateKey {
        DuplicateKey::from(self)
    }
}
