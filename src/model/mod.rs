//! Types that represent the core data model, such as `Transaction` and `Amount`.
mod amount;
mod category;
mod row;
mod transaction;

pub use amount::{
    Amount, AmountError, Currency, Formatted, MATCH_TOLERANCE, MAX_AMOUNT, MAX_SIGNIFICANT_DIGITS,
};
pub use category::{CategoryRegistry, DEFAULT_CATEGORIES};
pub use row::DisplayRow;
pub use transaction::{
    Kind, NewTransaction, Transaction, TransactionId, DATE_FORMAT, MONTH_FORMAT, NOT_APPLICABLE,
    UNCATEGORIZED,
};
