//! Month and category filtering of the merged income and expense list.

use crate::model::{Kind, Transaction, DATE_FORMAT};
use crate::store::Document;
use anyhow::bail;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The filter value that selects everything. It cannot be used as a category name.
pub const ALL: &str = "all";

/// Restricts a listing to one `YYYY-MM` month.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub enum MonthFilter {
    #[default]
    All,
    Month(String),
}

impl FromStr for MonthFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(ALL) {
            return Ok(Self::All);
        }
        if s.len() != 7 || NaiveDate::parse_from_str(&format!("{s}-01"), DATE_FORMAT).is_err() {
            bail!("Invalid month '{s}', expected YYYY-MM or 'all'");
        }
        Ok(Self::Month(s.to_string()))
    }
}

impl Display for MonthFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MonthFilter::All => f.write_str(ALL),
            MonthFilter::Month(m) => f.write_str(m),
        }
    }
}

/// Restricts a listing to expenses of one category. Income never has a category, so any named
/// filter excludes it.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl FromStr for CategoryFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            bail!("The category filter cannot be empty");
        }
        // Only the exact keyword, so that a category such as `All` can still be selected.
        if s == ALL {
            return Ok(Self::All);
        }
        Ok(Self::Named(s.to_string()))
    }
}

impl Display for CategoryFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryFilter::All => f.write_str(ALL),
            CategoryFilter::Named(c) => f.write_str(c),
        }
    }
}

/// A transaction tagged with the list it is stored in.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct Entry<'a> {
    pub kind: Kind,
    pub transaction: &'a Transaction,
}

/// The distinct `YYYY-MM` months of all transactions, newest first. Records without a valid date
/// are ignored.
pub fn available_months(document: &Document) -> Vec<String> {
    let months: BTreeSet<String> = document
        .entries()
        .filter_map(|(_, t)| t.month())
        .collect();
    months.into_iter().rev().collect()
}

/// Both lists merged, filtered and sorted by date, newest first. Records with the same date keep
/// their storage order with income before expenses. Records without a valid date are skipped.
pub fn filter<'a>(
    document: &'a Document,
    month: &MonthFilter,
    category: &CategoryFilter,
) -> Vec<Entry<'a>> {
    let mut entries: Vec<(NaiveDate, Entry<'a>)> = document
        .entries()
        .filter_map(|(kind, transaction)| {
            let date = transaction.parsed_date()?;
            let month_ok = match month {
                MonthFilter::All => true,
                MonthFilter::Month(m) => transaction.month().as_deref() == Some(m.as_str()),
            };
            let category_ok = match category {
                CategoryFilter::All => true,
                CategoryFilter::Named(c) => {
                    kind == Kind::Expense && transaction.category() == Some(c.as_str())
                }
            };
            (month_ok && category_ok).then_some((date, Entry { kind, transaction }))
        })
        .collect();
    entries.sort_by(|a, b| b.0.cmp(&a.0));
    entries.into_iter().map(|(_, entry)| entry).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewTransaction;

    fn push(document: &mut Document, input: NewTransaction) {
        let kind = input.kind;
        document.push(kind, input.validate().unwrap());
    }

    fn sample() -> Document {
        let mut document = Document::default();
        push(&mut document, NewTransaction::income("Salary", "1000", "2024-01-05"));
        push(&mut document, NewTransaction::income("Bonus", "200", "2024-02-01"));
        push(&mut document, NewTransaction::expense("Coffee", "2.5", "2024-01-06", "Food"));
        push(&mut document, NewTransaction::expense("Bus", "1", "2024-01-05", "Transport"));
        document
    }

    #[test]
    fn test_available_months() {
        let mut document = sample();
        let legacy: Transaction =
            serde_json::from_str(r#"{"description": "Old", "amount": 3, "date": "yesterday"}"#)
                .unwrap();
        document.push(Kind::Income, legacy);
        assert_eq!(available_months(&document), vec!["2024-02", "2024-01"]);
        assert!(available_months(&Document::default()).is_empty());
    }

    #[test]
    fn test_filter_all_is_sorted_and_complete() {
        let document = sample();
        let entries = filter(&document, &MonthFilter::All, &CategoryFilter::All);
        assert_eq!(entries.len(), document.len());
        let names: Vec<&str> = entries.iter().map(|e| e.transaction.description()).collect();
        // Salary and Bus share a date; Salary is income so it comes first.
        assert_eq!(names, vec!["Bonus", "Coffee", "Salary", "Bus"]);
        assert!(entries
            .windows(2)
            .all(|w| w[0].transaction.date() >= w[1].transaction.date()));
    }

    #[test]
    fn test_filter_month_and_category() {
        let document = sample();
        let month = MonthFilter::from_str("2024-01").unwrap();
        let entries = filter(&document, &month, &CategoryFilter::All);
        assert_eq!(entries.len(), 3);

        let food = CategoryFilter::from_str("Food").unwrap();
        let entries = filter(&document, &month, &food);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, Kind::Expense);

        let none = MonthFilter::from_str("2023-12").unwrap();
        assert!(filter(&document, &none, &CategoryFilter::All).is_empty());
    }

    #[test]
    fn test_named_category_excludes_income() {
        let mut document = Document::default();
        push(&mut document, NewTransaction::income("Salary", "1000", "2024-01-05"));
        let food = CategoryFilter::Named("Food".into());
        assert!(filter(&document, &MonthFilter::All, &food).is_empty());
    }

    #[test]
    fn test_parse_filters() {
        assert_eq!(MonthFilter::from_str("ALL").unwrap(), MonthFilter::All);
        assert!(MonthFilter::from_str("2024-13").is_err());
        assert!(MonthFilter::from_str("2024-1").is_err());
        assert!(MonthFilter::from_str("January").is_err());
        assert_eq!(CategoryFilter::from_str("all").unwrap(), CategoryFilter::All);
        assert_eq!(
            CategoryFilter::from_str("All").unwrap(),
            CategoryFilter::Named("All".into())
        );
        assert_eq!(
            CategoryFilter::from_str(" Food ").unwrap(),
            CategoryFilter::Named("Food".into())
        );
        assert!(CategoryFilter::from_str(" ").is_err());
    }
}
