//! The summary command: where the money went.

use crate::commands::Out;
use crate::model::{Amount, CashFlow, Ledger};
use crate::{Config, Result};
use anyhow::Context;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Cash-flow totals for the whole ledger. Outflows are reported as positive numbers.
///
/// These are the flows of a cash-flow diagram: cash in feeds cash out and cash investments, which
/// in turn feed the individual vendors.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct Summary {
    pub cash_in: Amount,
    pub cash_out: Amount,
    pub cash_investments: Amount,
    pub cash_out_by_vendor: BTreeMap<String, Amount>,
    pub cash_investments_by_vendor: BTreeMap<String, Amount>,
}

impl Summary {
    pub fn new(ledger: &Ledger) -> Self {
        let mut cash_in = Decimal::ZERO;
        let mut cash_out = Decimal::ZERO;
        let mut cash_investments = Decimal::ZERO;
        let mut out_by_vendor: BTreeMap<String, Decimal> = BTreeMap::new();
        let mut investments_by_vendor: BTreeMap<String, Decimal> = BTreeMap::new();

        for t in ledger.transactions() {
            let value = t.amount().value();
            match t.cash_flow() {
                CashFlow::CashIn => cash_in += value,
                CashFlow::CashOut => {
                    cash_out += value.abs();
                    *out_by_vendor.entry(t.vendor().to_string()).or_default() += value.abs();
                }
                CashFlow::CashInvestments => {
                    cash_investments += value.abs();
                    *investments_by_vendor
                        .entry(t.vendor().to_string())
                        .or_default() += value.abs();
                }
            }
        }

        Self {
            cash_in: Amount::new(cash_in),
            cash_out: Amount::new(cash_out),
            cash_investments: Amount::new(cash_investments),
            cash_out_by_vendor: out_by_vendor
                .into_iter()
                .map(|(k, v)| (k, Amount::new(v)))
                .collect(),
            cash_investments_by_vendor: investments_by_vendor
                .into_iter()
                .map(|(k, v)| (k, Amount::new(v)))
                .collect(),
        }
    }

    fn render(&self, records: usize) -> String {
        let mut s = String::new();
        let _ = writeln!(s, "Cash flow summary of {records} record(s)");
        let _ = writeln!(s, "  cash_in:          {:>14}", dollars(self.cash_in));
        let _ = writeln!(s, "  cash_out:         {:>14}", dollars(self.cash_out));
        for (vendor, amount) in &self.cash_out_by_vendor {
            let _ = writeln!(s, "    {vendor:<20} {:>12}", dollars(*amount));
        }
        let _ = write!(
            s,
            "  cash_investments: {:>14}",
            dollars(self.cash_investments)
        );
        for (vendor, amount) in &self.cash_investments_by_vendor {
            let _ = write!(s, "\n    {vendor:<20} {:>12}", dollars(*amount));
        }
        s
    }
}

/// Renders an amount for people: dollar sign, thousands separators, two decimal places. Only used
/// for display; the ledger keeps exact values.
fn dollars(amount: Amount) -> String {
    let value = amount.value();
    let sign = if amount.is_negative() { "-" } else { "" };
    let num = format_num::format_num!(",.2", value.abs().to_f64().unwrap_or_default());
    format!("{sign}${num}")
}

/// Reads the ledger and reports cash-flow totals overall and per vendor.
///
/// # Errors
/// - There is no ledger yet, or it cannot be read.
pub fn summary(config: &Config) -> Result<Out<Summary>> {
    let ledger = Ledger::load(config.ledger_path())?.with_context(|| {
        format!(
            "There is no ledger at {}, run an import first",
            config.ledger_path().display()
        )
    })?;
    let summary = Summary::new(&ledger);
    Ok(Out::new(summary.render(ledger.len()), summary))
}
