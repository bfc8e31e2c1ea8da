use crate::model::transaction::UNKNOWN_VENDOR;
use crate::model::{DuplicateKey, Transaction};
use crate::{utils, Result};
use anyhow::{bail, Context};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// The columns of the ledger file, in the order they are written.
pub const LEDGER_HEADERS: [&str; 5] = ["date", "amount", "description", "vendors", "cash_flow"];

/// The full, ordered set of classified transactions that have been imported so far.
///
/// The ledger is loaded once at the start of a run, extended in memory, and written back in full.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct Ledger {
    data: Vec<Transaction>,
}

impl Ledger {
    pub fn new(data: Vec<Transaction>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.data
    }

    /// The duplicate keys of every transaction in the ledger.
    pub fn keys(&self) -> HashSet<DuplicateKey> {
        self.data.iter().map(DuplicateKey::from).collect()
    }

    pub(crate) fn extend(&mut self, transactions: impl IntoIterator<Item = Transaction>) {
        self.data.extend(transactions)
    }

    /// Loads the ledger at `path`. Returns `Ok(None)` if there is no file there, which is the
    /// normal state before the first import.
    ///
    /// # Errors
    /// - The file exists but cannot be read.
    /// - The header row is missing any of [`LEDGER_HEADERS`].
    /// - A row cannot be parsed.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            debug!("No ledger found at {}", path.display());
            return Ok(None);
        }
        let f = std::fs::File::open(path)
            .with_context(|| format!("Unable to open ledger file {}", path.display()))?;
        let ledger = Self::parse(f, &path.to_string_lossy())?;
        debug!("Read {} records from {}", ledger.len(), path.display());
        Ok(Some(ledger))
    }

    /// Parses ledger CSV data. `source` names the data in error messages.
    pub fn parse(reader: impl Read, source: &str) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let found: Vec<String> = rdr
            .headers()
            .with_context(|| format!("Unable to read the header row of ledger {source}"))?
            .iter()
            .map(str::to_string)
            .collect();
        let missing: Vec<&str> = LEDGER_HEADERS
            .iter()
            .copied()
            .filter(|expected| !found.iter().any(|h| h == expected))
            .collect();
        if !missing.is_empty() {
            bail!(
                "Ledger {source} is missing key column(s) {missing:?}: expected {} columns \
                {LEDGER_HEADERS:?}, found {} columns {found:?}",
                LEDGER_HEADERS.len(),
                found.len(),
            );
        }

        let mut data = Vec::new();
        for (ix, result) in rdr.deserialize::<Transaction>().enumerate() {
            // +2 accounts for the header row and 1-based line numbers
            let mut transaction =
                result.with_context(|| format!("Unable to parse row {} of ledger {source}", ix + 2))?;
            if transaction.vendor.is_empty() {
                transaction.vendor = UNKNOWN_VENDOR.to_string();
            }
            data.push(transaction);
        }
        Ok(Self { data })
    }

    /// Serializes the ledger to CSV, header row included even when the ledger is empty.
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        wtr.write_record(LEDGER_HEADERS)
            .context("Unable to write ledger header")?;
        for transaction in &self.data {
            wtr.serialize(transaction)
                .context("Unable to serialize ledger row")?;
        }
        wtr.into_inner()
            .map_err(|e| anyhow::anyhow!("Unable to flush ledger data: {}", e.error()))
    }

    /// Writes the whole ledger to `path`, replacing whatever was there.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = self.to_csv()?;
        utils::write_atomic(path, data)
            .with_context(|| format!("Unable to save ledger to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, CashFlow};
    use std::str::FromStr;
    use tempfile::TempDir;

    fn sample() -> Ledger {
        Ledger::new(vec![
            Transaction::new(
                "2025-03-01",
                Amount::from_str("-50.00").unwrap(),
                "ACME STORE",
                "Acme",
                CashFlow::CashOut,
            ),
            Transaction::new(
                "2025-03-02",
                Amount::from_str("1200.00").unwrap(),
                "PAYROLL, INC",
                "Other",
                CashFlow::CashIn,
            ),
        ])
    }

    #[test]
    fn test_to_csv() {
        let csv = String::from_utf8(sample().to_csv().unwrap()).unwrap();
        let expected = "date,amount,description,vendors,cash_flow\n\
            2025-03-01,-50.00,ACME STORE,Acme,cash_out\n\
            2025-03-02,1200.00,\"PAYROLL, INC\",Other,cash_in\n";
        assert_eq!(csv, expected);
    }

    #[test]
    fn test_empty_ledger_has_header() {
        let csv = String::from_utf8(Ledger::default().to_csv().unwrap()).unwrap();
        assert_eq!(csv, "date,amount,description,vendors,cash_flow\n");
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("processed_transactions.csv");
        let original = sample();
        original.save(&path).unwrap();
        let loaded = Ledger::load(&path).unwrap().unwrap();
        assert_eq!(original, loaded);
    }

    #[test]
    fn test_load_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("processed_transactions.csv");
        assert!(Ledger::load(&path).unwrap().is_none());
    }

    #[test]
    fn test_parse_columns_by_name() {
        let data = "cash_flow,vendors,description,amount,date,note\n\
            cash_in,Other,REFUND,5.0,2025-01-01,x\n";
        let ledger = Ledger::parse(data.as_bytes(), "test").unwrap();
        assert_eq!(ledger.len(), 1);
        let t = &ledger.transactions()[0];
        assert_eq!(t.date(), "2025-01-01");
        assert_eq!(t.amount().to_string(), "5.0");
        assert_eq!(t.cash_flow(), CashFlow::CashIn);
    }

    #[test]
    fn test_parse_padded_headers() {
        let data = "date, amount , description,vendors ,cash_flow\n\
            2025-01-01,-5.00,COFFEE,Coffee,cash_out\n";
        let ledger = Ledger::parse(data.as_bytes(), "test").unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.transactions()[0].vendor(), "Coffee");
    }

    #[test]
    fn test_parse_missing_column() {
        let data = "date,amount,vendors,cash_flow\n2025-01-01,5.0,Other,cash_in\n";
        let err = Ledger::parse(data.as_bytes(), "ledger.csv").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("missing key column"));
        assert!(message.contains("description"));
        assert!(message.contains("ledger.csv"));
        assert!(message.contains("found 4 columns"));
    }

    #[test]
    fn test_parse_bad_amount() {
        let data = "date,amount,description,vendors,cash_flow\n2025-01-01,abc,X,Other,cash_in\n";
        let err = Ledger::parse(data.as_bytes(), "ledger.csv").unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_parse_empty_vendor() {
        let data = "date,amount,description,vendors,cash_flow\n2025-01-01,-3,X,,cash_out\n";
        let ledger = Ledger::parse(data.as_bytes(), "test").unwrap();
        assert_eq!(ledger.transactions()[0].vendor(), UNKNOWN_VENDOR);
    }
}
