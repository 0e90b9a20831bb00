//! Totals and per-category expense aggregation.

use crate::model::{Amount, Transaction};
use crate::store::Document;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize)]
pub struct Totals {
    pub income: Amount,
    pub expenses: Amount,
    /// `income - expenses`, negative when overspent.
    pub balance: Amount,
}

/// One category's part of total spending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub amount: Amount,
    /// Share of the summed amounts, from 0 to 100.
    pub percent: f64,
}

pub fn totals(document: &Document) -> Totals {
    let income: Amount = document.income().iter().map(Transaction::amount).sum();
    let expenses: Amount = document.expenses().iter().map(Transaction::amount).sum();
    Totals {
        income,
        expenses,
        balance: income - expenses,
    }
}

/// Sums expenses per category. Expenses without a category are summed under `Uncategorized`.
pub fn by_category<'a>(
    expenses: impl IntoIterator<Item = &'a Transaction>,
) -> BTreeMap<String, Amount> {
    let mut sums: BTreeMap<String, Amount> = BTreeMap::new();
    for expense in expenses {
        *sums
            .entry(expense.category_or_uncategorized().to_string())
            .or_default() += expense.amount();
    }
    sums
}

/// The categories ordered by amount, largest first. Equal amounts keep the alphabetical order of
/// the map.
pub fn breakdown(sums: &BTreeMap<String, Amount>) -> Vec<CategoryShare> {
    let total: Decimal = sums.values().sum::<Amount>().value();
    let mut shares: Vec<CategoryShare> = sums
        .iter()
        .map(|(category, amount)| {
            // The ratio is at most one, so scaling it to a percentage cannot overflow.
            let percent = amount
                .value()
                .checked_div(total)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .and_then(|p| p.to_f64())
                .unwrap_or_default();
            CategoryShare {
                category: category.clone(),
                amount: *amount,
                percent,
            }
        })
        .collect();
    shares.sort_by(|a, b| b.amount.cmp(&a.amount));
    shares
}
