//! Turns the rows of a raw bank export into classified transactions.

use crate::classify::Classifier;
use crate::model::{Amount, MalformedRow, RawRecord, Transaction};
use crate::Result;
use anyhow::Context;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// How many skipped rows are shown when reporting them.
const SKIPPED_SAMPLE: usize = 5;

/// Reads a raw export: CSV, no header row, any number of fields per row. Rows are validated as
/// they are read, and rows that are too short come back as `Err(MalformedRow)` so that the
/// transformer can count them.
///
/// # Errors
/// - The file does not exist or cannot be read. This is fatal for the run.
pub fn read_raw(path: &Path) -> Result<Vec<std::result::Result<RawRecord, MalformedRow>>> {
    let f = std::fs::File::open(path)
        .with_context(|| format!("Unable to open raw export {}", path.display()))?;
    parse_raw(f).with_context(|| format!("Unable to read raw export {}", path.display()))
}

/// Reads raw export CSV data from any reader. See [`read_raw`].
pub fn parse_raw(reader: impl Read) -> Result<Vec<std::result::Result<RawRecord, MalformedRow>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();
    for (ix, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Unable to read raw row {}", ix + 1))?;
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(ix as u64 + 1);
        rows.push(RawRecord::new(line, record.iter()));
    }
    Ok(rows)
}

/// Why a raw row was left out of the output.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum SkipReason {
    /// The row has fewer fields than a date, an amount and a description need.
    Malformed { found: usize },
    /// The amount field is not a number.
    NonNumericAmount { value: String },
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Malformed { found } => write!(f, "only {found} field(s)"),
            SkipReason::NonNumericAmount { value } => write!(f, "non-numeric amount '{value}'"),
        }
    }
}

/// A raw row that was dropped, with enough context for the operator to find it.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct SkippedRow {
    pub line: u64,
    pub content: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

impl Display for SkippedRow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {} [{}]", self.line, self.reason, self.content)
    }
}

/// The result of transforming a batch of raw rows.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Transformed {
    /// One classified transaction per usable row, in input order.
    pub transactions: Vec<Transaction>,
    /// Rows that were dropped, in input order.
    pub skipped: Vec<SkippedRow>,
}

impl Transformed {
    /// The number of rows that went in.
    pub fn rows_in(&self) -> usize {
        self.transactions.len() + self.skipped.len()
    }

    /// Logs one warning summarizing the skipped rows, if there are any.
    pub fn report(&self) {
        if self.skipped.is_empty() {
            return;
        }
        let malformed = self
            .skipped
            .iter()
            .filter(|s| matches!(s.reason, SkipReason::Malformed { .. }))
            .count();
        let non_numeric = self.skipped.len() - malformed;
        let sample = self
            .skipped
            .iter()
            .take(SKIPPED_SAMPLE)
            .map(|s| format!("  {s}"))
            .collect::<Vec<_>>()
            .join("\n");
        warn!(
            "Removed {} row(s): {malformed} malformed, {non_numeric} with non-numeric amount \
            values. First {}:\n{sample}",
            self.skipped.len(),
            self.skipped.len().min(SKIPPED_SAMPLE),
        );
    }
}

/// Classifies each raw row. Rows that are malformed, or whose amount is not a number, are
/// collected in [`Transformed::skipped`] instead of failing the batch. The output order follows
/// the input order and does not depend on anything but the input and the `classifier`.
pub fn transform<I>(rows: I, classifier: &Classifier) -> Transformed
where
    I: IntoIterator<Item = std::result::Result<RawRecord, MalformedRow>>,
{
    let mut out = Transformed::default();
    for row in rows {
        let record = match row {
            Ok(record) => record,
            Err(malformed) => {
                out.skipped.push(SkippedRow {
                    line: malformed.line,
                    content: malformed.content,
                    reason: SkipReason::Malformed {
                        found: malformed.found,
                    },
                });
                continue;
            }
        };
        match transform_one(&record, classifier) {
            Some(transaction) => out.transactions.push(transaction),
            None => out.skipped.push(SkippedRow {
                line: record.line(),
                content: record.to_string(),
                reason: SkipReason::NonNumericAmount {
                    value: record.amount().to_string(),
                },
            }),
        }
    }
    debug!(
        "Transformed {} row(s) into {} transaction(s)",
        out.rows_in(),
        out.transactions.len()
    );
    out
}

fn transform_one(record: &RawRecord, classifier: &Classifier) -> Option<Transaction> {
    let amount = Amount::from_str(record.amount()).ok()?;
    let (vendor, cash_flow) = classifier.classify(record.description(), &amount);
    Some(Transaction::new(
        record.date(),
        amount,
        record.description(),
        vendor,
        cash_flow,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CashFlow, UNKNOWN_VENDOR};
    use crate::VendorPatterns;

    fn classifier() -> Classifier {
        let patterns = VendorPatterns::new(vec![
            ("Acme", vec!["acme"]),
            ("Vanguard", vec!["vanguard"]),
        ]);
        Classifier::new(&patterns, ["Vanguard"])
    }

    fn run(csv: &str) -> Transformed {
        transform(parse_raw(csv.as_bytes()).unwrap(), &classifier())
    }

    #[test]
    fn test_three_valid_rows() {
        let out = run("03/01/2025,-50.00,*,,ACME STORE\n\
            03/02/2025,-500.00,*,,VANGUARD BUY\n\
            03/03/2025,1500.00,*,,PAYROLL\n");
        assert!(out.skipped.is_empty());
        let got: Vec<(&str, String, &str, CashFlow)> = out
            .transactions
            .iter()
            .map(|t| (t.date(), t.amount().to_string(), t.vendor(), t.cash_flow()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("03/01/2025", "-50.00".to_string(), "Acme", CashFlow::CashOut),
                (
                    "03/02/2025",
                    "-500.00".to_string(),
                    "Vanguard",
                    CashFlow::CashInvestments
                ),
                (
                    "03/03/2025",
                    "1500.00".to_string(),
                    UNKNOWN_VENDOR,
                    CashFlow::CashIn
                ),
            ]
        );
    }

    #[test]
    fn test_non_numeric_amount_is_dropped() {
        let out = run("2025-03-01,abc,ACME\n2025-03-02,-5.00,ACME\n");
        assert_eq!(out.transactions.len(), 1);
        assert_eq!(out.transactions[0].date(), "2025-03-02");
        assert_eq!(
            out.skipped,
            vec![SkippedRow {
                line: 1,
                content: "2025-03-01,abc,ACME".to_string(),
                reason: SkipReason::NonNumericAmount {
                    value: "abc".to_string()
                },
            }]
        );
    }

    #[test]
    fn test_empty_amount_is_dropped() {
        let out = run("2025-03-01,,ACME\n");
        assert!(out.transactions.is_empty());
        assert_eq!(out.skipped.len(), 1);
    }

    #[test]
    fn test_short_row_does_not_abort_batch() {
        let out = run("2025-03-01,-5.00\n2025-03-02,-6.00,ACME\n2025-03-03,7.00,REFUND\n");
        assert_eq!(out.transactions.len(), 2);
        assert_eq!(out.rows_in(), 3);
        assert_eq!(
            out.skipped,
            vec![SkippedRow {
                line: 1,
                content: "2025-03-01,-5.00".to_string(),
                reason: SkipReason::Malformed { found: 2 },
            }]
        );
    }

    #[test]
    fn test_deterministic() {
        let csv = "03/01/2025,-50.00,*,,ACME STORE\n03/03/2025,abc,*,,PAYROLL\n";
        assert_eq!(run(csv), run(csv));
    }

    #[test]
    fn test_empty_input() {
        let out = run("");
        assert_eq!(out.rows_in(), 0);
    }

    #[test]
    fn test_read_raw_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = read_raw(&dir.path().join("export.csv")).unwrap_err();
        assert!(err.to_string().contains("export.csv"));
    }

    #[test]
    fn test_skipped_row_display() {
        let row = SkippedRow {
            line: 4,
            content: "x,abc,y".to_string(),
            reason: SkipReason::NonNumericAmount {
                value: "abc".to_string(),
            },
        };
        assert_eq!(row.to_string(), "line 4: non-numeric amount 'abc' [x,abc,y]");
    }
}
