//! Types that represent the core data model, such as `RawRecord`, `Transaction` and `Ledger`.
mod amount;
mod key;
mod ledger;
mod raw;
mod transaction;

pub use amount::{Amount, AmountError};
pub use key::DuplicateKey;
pub use ledger::{Ledger, LEDGER_HEADERS};
pub use raw::{MalformedRow, RawRecord, MIN_FIELDS};
pub use transaction::{CashFlow, Transaction, UNKNOWN_VENDOR};
