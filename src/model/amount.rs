//! Amount type for the signed monetary value of a transaction.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A signed money amount. Negative amounts leave the account, positive amounts enter it.
///
/// Parsing accepts the spellings bank exports use (`-$1,250.00`, `1,000.005`, ` 12.5 `), but the
/// value is always written back as a plain decimal number with its scale intact, so that an
/// amount read from the ledger is exactly the amount that was written to it.
///
/// ```
/// # use cashflow_ledger::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("-$1,250.00").unwrap();
/// assert_eq!(amount.to_string(), "-1250.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// True for strictly negative amounts. `-0.00` is not negative.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// Returns the value with trailing zeros stripped and `-0` folded into `0`, so that `12.50`,
    /// `12.5` and `12.500` all produce the same `Decimal`.
    pub fn normalized(&self) -> Decimal {
        self.0.normalize()
    }
}

/// The text could not be read as an amount.
#[derive(Debug)]
pub struct AmountError {
    input: String,
    source: rust_decimal::Error,
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not an amount: {}", self.input, self.source)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Accepts an optional leading `-`, then an optional `$`, then a decimal number that may use
    /// `,` as a thousands separator. Empty text is an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (sign, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", trimmed),
        };
        let digits = unsigned.strip_prefix('$').unwrap_or(unsigned).replace(',', "");
        Decimal::from_str(&format!("{sign}{digits}"))
            .map(Amount)
            .map_err(|source| AmountError {
                input: s.to_string(),
                source,
            })
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_bank_spellings() {
        let cases = [
            ("-50.00", "-50.00"),
            ("$50.00", "50.00"),
            ("-$1,250.00", "-1250.00"),
            ("1,000.005", "1000.005"),
            ("  12.5 ", "12.5"),
            ("0", "0"),
        ];
        for (input, expected) in cases {
            let amount = Amount::from_str(input).unwrap();
            assert_eq!(amount.value(), dec(expected), "{input}");
        }
    }

    #[test]
    fn test_parse_rejects_non_numbers() {
        for input in ["", "   ", "abc", "$", "12.5.1", "--5", "N/A"] {
            assert!(Amount::from_str(input).is_err(), "{input}");
        }
    }

    #[test]
    fn test_error_names_the_input() {
        let err = Amount::from_str("abc").unwrap_err();
        assert!(err.to_string().contains("'abc'"));
    }

    #[test]
    fn test_written_as_plain_exact_decimal() {
        let amount = Amount::from_str("-$1,000.005").unwrap();
        assert_eq!(amount.to_string(), "-1000.005");
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"-1000.005\"");
    }

    #[test]
    fn test_written_value_reads_back_identically() {
        for input in ["1,234,567.891", "-$0.10", "12.500"] {
            let amount = Amount::from_str(input).unwrap();
            let again = Amount::from_str(&amount.to_string()).unwrap();
            assert_eq!(amount.to_string(), again.to_string());
            assert_eq!(amount.normalized(), again.normalized());
        }
    }

    #[test]
    fn test_normalized_ignores_trailing_zeros() {
        let a = Amount::from_str("12.50").unwrap();
        let b = Amount::from_str("12.5").unwrap();
        let c = Amount::from_str("12.500").unwrap();
        assert_eq!(a.normalized(), b.normalized());
        assert_eq!(b.normalized(), c.normalized());
        assert_eq!(a.normalized().to_string(), "12.5");
    }

    #[test]
    fn test_negative_zero() {
        let a = Amount::from_str("-0.00").unwrap();
        assert!(a.is_zero());
        assert!(!a.is_negative());
        assert_eq!(a.normalized(), Amount::from_str("0").unwrap().normalized());
    }

    #[test]
    fn test_deserialize_ledger_value() {
        let amount: Amount = serde_json::from_str("\"-4.50\"").unwrap();
        assert!(amount.is_negative());
        assert_eq!(amount.value(), dec("-4.50"));
    }
}
