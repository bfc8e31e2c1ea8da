use std::fmt::{Display, Formatter};

/// The fewest fields a raw row can have and still carry a date, an amount and a description.
pub const MIN_FIELDS: usize = 3;

const DATE_INDEX: usize = 0;
const AMOUNT_INDEX: usize = 1;
/// Where the description lives in the full bank export layout:
/// `date, amount, flag, check number, description`.
const WIDE_DESCRIPTION_INDEX: usize = 4;
/// Where the description lives when the row has only the minimal columns.
const NARROW_DESCRIPTION_INDEX: usize = 2;

/// A raw row has too few fields to be used.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MalformedRow {
    pub line: u64,
    pub found: usize,
    pub content: String,
}

impl Display for MalformedRow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Row at line {} has {} field(s), expected at least {MIN_FIELDS}",
            self.line, self.found
        )
    }
}

impl std::error::Error for MalformedRow {}

/// One row of a raw bank export, as read from a CSV file with no header row.
///
/// A `RawRecord` can only be constructed with at least [`MIN_FIELDS`] fields, so the accessors
/// never fail.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RawRecord {
    line: u64,
    fields: Vec<String>,
}

impl RawRecord {
    /// Validates the number of fields in a raw row. `line` is the 1-based line number in the
    /// source file and is only used for reporting.
    pub fn new<S, I>(line: u64, fields: I) -> Result<Self, MalformedRow>
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let fields: Vec<String> = fields.into_iter().map(|s| s.into()).collect();
        if fields.len() < MIN_FIELDS {
            return Err(MalformedRow {
                line,
                found: fields.len(),
                content: fields.join(","),
            });
        }
        Ok(Self { line, fields })
    }

    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn date(&self) -> &str {
        self.fields[DATE_INDEX].trim()
    }

    /// The amount exactly as it appeared in the export. Parsing happens in the transformer.
    pub fn amount(&self) -> &str {
        &self.fields[AMOUNT_INDEX]
    }

    pub fn description(&self) -> &str {
        let ix = if self.fields.len() > WIDE_DESCRIPTION_INDEX {
            WIDE_DESCRIPTION_INDEX
        } else {
            NARROW_DESCRIPTION_INDEX
        };
        self.fields[ix].trim()
    }
}

impl Display for RawRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.fields.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_row() {
        let r = RawRecord::new(1, ["03/01/2025", "-50.00", "*", "", "ACME STORE #12"]).unwrap();
        assert_eq!(r.date(), "03/01/2025");
        assert_eq!(r.amount(), "-50.00");
        assert_eq!(r.description(), "ACME STORE #12");
    }

    #[test]
    fn test_narrow_row() {
        let r = RawRecord::new(7, ["2025-03-01", "12.5", " PAYROLL "]).unwrap();
        assert_eq!(r.line(), 7);
        assert_eq!(r.description(), "PAYROLL");
    }

    #[test]
    fn test_four_fields_uses_narrow_description() {
        let r = RawRecord::new(1, ["2025-03-01", "12.5", "DEPOSIT", "extra"]).unwrap();
        assert_eq!(r.description(), "DEPOSIT");
    }

    #[test]
    fn test_short_row_is_malformed() {
        let err = RawRecord::new(3, ["2025-03-01", "12.5"]).unwrap_err();
        assert_eq!(
            err,
            MalformedRow {
                line: 3,
                found: 2,
                content: "2025-03-01,12.5".to_string(),
            }
        );
        assert!(err.to_string().contains("expected at least 3"));
    }
}
