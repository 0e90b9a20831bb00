//! The formatted projection of a transaction that is shown in a table, and the logic to find the
//! stored record a formatted row came from.

use crate::model::{Amount, Currency, Kind, Transaction, TransactionId, NOT_APPLICABLE};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One line of the transactions table. Every field except `id` is display text, so a row can be
/// lossy: `amount` has been formatted with a currency and `category` carries `N/A` for income.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct DisplayRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TransactionId>,
    pub kind: Kind,
    pub date: String,
    pub description: String,
    pub amount: String,
    pub category: String,
}

impl DisplayRow {
    pub fn new(kind: Kind, transaction: &Transaction, currency: &Currency) -> Self {
        let category = match kind {
            Kind::Income => NOT_APPLICABLE.to_string(),
            Kind::Expense => transaction.category_or_uncategorized().to_string(),
        };
        Self {
            id: Some(transaction.id().clone()),
            kind,
            date: transaction.date().to_string(),
            description: transaction.description().to_string(),
            amount: transaction.amount().display(currency).to_string(),
            category,
        }
    }

    /// Returns a copy of this row without its id, i.e. only the text a user would see.
    pub fn without_id(&self) -> Self {
        Self {
            id: None,
            ..self.clone()
        }
    }

    /// True if this row could have been produced from `transaction` stored under `kind`.
    ///
    /// A row with an id matches by id alone. Otherwise: the kinds are equal, the date and
    /// description strings are identical, the categories are identical and the amount parsed back
    /// out of the row is within `MATCH_TOLERANCE` of the stored amount.
    pub fn matches(&self, kind: Kind, transaction: &Transaction) -> bool {
        if let Some(id) = &self.id {
            return self.kind == kind && id == transaction.id();
        }
        let Some(row_amount) = Amount::parse_display(&self.amount) else {
            return false;
        };
        let stored_category = match kind {
            Kind::Income => NOT_APPLICABLE,
            Kind::Expense => transaction.category_or_uncategorized(),
        };
        self.kind == kind
            && self.date == transaction.date()
            && self.description == transaction.description()
            && self.category == stored_category
            && row_amount.approx_eq(&transaction.amount())
    }
}

/// Parses the pipe-separated form `kind|date|description|amount|category` used on the command
/// line, e.g. `expense|2024-01-06|Coffee|2.5 FCFA|Food`.
impl FromStr for DisplayRow {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split('|').map(str::trim).collect();
        if fields.len() != 5 {
            bail!(
                "Expected 5 fields 'kind|date|description|amount|category' but found {} in '{s}'",
                fields.len()
            );
        }
        let kind = Kind::from_str(&fields[0].to_lowercase())
            .with_context(|| format!("Unknown transaction kind '{}'", fields[0]))?;
        Ok(Self {
            id: None,
            kind,
            date: fields[1].to_string(),
            description: fields[2].to_string(),
            amount: fields[3].to_string(),
            category: fields[4].to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewTransaction;

    fn coffee() -> Transaction {
        NewTransaction::expense("Coffee", "1500", "2024-01-06", "Food")
            .validate()
            .unwrap()
    }

    #[test]
    fn test_row_text() {
        let row = DisplayRow::new(Kind::Expense, &coffee(), &Currency::default());
        assert_eq!(row.amount, "1 500 FCFA");
        assert_eq!(row.category, "Food");

        let salary = NewTransaction::income("Salary", "1000", "2024-01-05")
            .validate()
            .unwrap();
        let row = DisplayRow::new(Kind::Income, &salary, &Currency::default());
        assert_eq!(row.category, NOT_APPLICABLE);
    }

    #[test]
    fn test_matches_by_fields() {
        let t = coffee();
        let row = DisplayRow::new(Kind::Expense, &t, &Currency::default()).without_id();
        assert!(row.matches(Kind::Expense, &t));
        assert!(!row.matches(Kind::Income, &t));

        let mut other = row.clone();
        other.description = "Tea".into();
        assert!(!other.matches(Kind::Expense, &t));

        let mut other = row.clone();
        other.amount = "1 501 FCFA".into();
        assert!(!other.matches(Kind::Expense, &t));

        let mut other = row.clone();
        other.amount = "no number".into();
        assert!(!other.matches(Kind::Expense, &t));
    }

    #[test]
    fn test_matches_by_id() {
        let t = coffee();
        let twin = coffee();
        let row = DisplayRow::new(Kind::Expense, &t, &Currency::default());
        assert!(row.matches(Kind::Expense, &t));
        assert!(!row.matches(Kind::Expense, &twin));
    }

    #[test]
    fn test_parse() {
        let row = DisplayRow::from_str("Expense | 2024-01-06 | Coffee | 2.5 FCFA | Food").unwrap();
        assert_eq!(row.kind, Kind::Expense);
        assert_eq!(row.amount, "2.5 FCFA");
        assert!(row.id.is_none());
        assert!(DisplayRow::from_str("expense|2024-01-06|Coffee").is_err());
        assert!(DisplayRow::from_str("refund|2024-01-06|Coffee|1|Food").is_err());
    }
}
