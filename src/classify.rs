//! Assigns a vendor and a cash-flow category to a transaction description.

use crate::model::{Amount, CashFlow, UNKNOWN_VENDOR};
use crate::VendorPatterns;
use std::collections::BTreeSet;

/// Lower-cases `s`, trims it and collapses runs of whitespace into a single space.
///
/// Vendor matching and duplicate keys both compare descriptions through this function.
pub fn normalize_text(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Maps descriptions to vendors and cash-flow categories using the configured patterns.
///
/// Patterns are normalized once, when the `Classifier` is built. Vendor order is significant: the
/// first vendor with a matching pattern wins.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    vendors: Vec<(String, Vec<String>)>,
    investment_vendors: BTreeSet<String>,
}

impl Classifier {
    pub fn new<S, I>(patterns: &VendorPatterns, investment_vendors: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let vendors = patterns
            .iter()
            .map(|(vendor, substrings)| {
                let substrings = substrings
                    .iter()
                    .map(|s| normalize_text(s))
                    .filter(|s| !s.is_empty())
                    .collect();
                (vendor.to_string(), substrings)
            })
            .collect();
        Self {
            vendors,
            investment_vendors: investment_vendors.into_iter().map(|s| s.into()).collect(),
        }
    }

    /// Returns the vendor and cash-flow category for a transaction.
    pub fn classify(&self, description: &str, amount: &Amount) -> (String, CashFlow) {
        let vendor = self.vendor(description);
        let cash_flow = self.cash_flow(&vendor, amount);
        (vendor, cash_flow)
    }

    /// The first vendor, in configuration order, that has a pattern contained in `description`.
    /// [`UNKNOWN_VENDOR`] if none match.
    pub fn vendor(&self, description: &str) -> String {
        let description = normalize_text(description);
        self.vendors
            .iter()
            .find(|(_, substrings)| substrings.iter().any(|s| description.contains(s.as_str())))
            .map(|(vendor, _)| vendor.clone())
            .unwrap_or_else(|| UNKNOWN_VENDOR.to_string())
    }

    /// Zero and positive amounts are `cash_in`. Negative amounts are `cash_investments` when the
    /// vendor is an investment vendor and `cash_out` otherwise.
    pub fn cash_flow(&self, vendor: &str, amount: &Amount) -> CashFlow {
        if !amount.is_negative() {
            CashFlow::CashIn
        } else if self.investment_vendors.contains(vendor) {
            CashFlow::CashInvestments
        } else {
            CashFlow::CashOut
        }
    }
}
