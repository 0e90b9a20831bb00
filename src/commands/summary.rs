use crate::commands::Out;
use crate::model::Currency;
use crate::summary::{breakdown, by_category, totals, CategoryShare, Totals};
use crate::{Config, Result};
use serde::Serialize;
use std::fmt::Write;

/// The widest bar of the chart, reached by a category holding all of the spending.
const BAR_WIDTH: usize = 30;

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub totals: Totals,
    pub breakdown: Vec<CategoryShare>,
}

/// Shows the balance, the totals and spending by category with a bar chart.
pub async fn summary(config: Config) -> Result<Out<Summary>> {
    let store = config.open_store().await;
    let document = store.document();
    let summary = Summary {
        totals: totals(document),
        breakdown: breakdown(&by_category(document.expenses())),
    };
    Ok(Out::new(render(&summary, config.currency()), summary))
}

fn render(summary: &Summary, currency: &Currency) -> String {
    let Totals {
        income,
        expenses,
        balance,
    } = summary.totals;
    let mut text = format!(
        "Balance:  {}\nIncome:   {}\nExpenses: {}\n",
        balance.display(currency),
        income.display(currency),
        expenses.display(currency)
    );

    let Some(top) = summary.breakdown.first() else {
        text.push_str("\nNo expenses yet");
        return text;
    };
    let _ = writeln!(text, "\nSpending by category (top: {}):", top.category);

    let labels: Vec<String> = summary
        .breakdown
        .iter()
        .map(|s| s.amount.display(currency).to_string())
        .collect();
    let name_width = summary
        .breakdown
        .iter()
        .map(|s| s.category.chars().count())
        .max()
        .unwrap_or(0);
    let amount_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

    for (share, label) in summary.breakdown.iter().zip(&labels) {
        let _ = writeln!(
            text,
            "  {:<name_width$}  {:>amount_width$}  {:>5.1}%  {}",
            share.category,
            label,
            share.percent,
            bar(share.percent)
        );
    }
    text.trim_end().to_string()
}

fn bar(percent: f64) -> String {
    let filled = (percent / 100.0 * BAR_WIDTH as f64).round().clamp(0.0, BAR_WIDTH as f64);
    let filled = filled as usize;
    // Every category with spending gets at least one block.
    let filled = if percent > 0.0 { filled.max(1) } else { filled };
    "#".repeat(filled)
}
