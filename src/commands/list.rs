use crate::args::ListArgs;
use crate::commands::{plural, Out};
use crate::filter::{available_months, filter};
use crate::model::DisplayRow;
use crate::{Config, Result};

const HEADERS: [&str; 6] = ["ID", "Kind", "Date", "Description", "Amount", "Category"];

/// Lists the transactions that pass the month and category filters, newest first.
pub async fn list(config: Config, args: ListArgs) -> Result<Out<Vec<DisplayRow>>> {
    let store = config.open_store().await;
    let rows: Vec<DisplayRow> = filter(store.document(), args.month(), args.category())
        .into_iter()
        .map(|e| DisplayRow::new(e.kind, e.transaction, config.currency()))
        .collect();
    if rows.is_empty() {
        return Ok(Out::new(
            format!(
                "No transactions for month '{}' and category '{}'",
                args.month(),
                args.category()
            ),
            rows,
        ));
    }
    let message = format!(
        "{}\n{}",
        table(&rows),
        plural(rows.len(), "transaction", "transactions")
    );
    Ok(Out::new(message, rows))
}

/// Lists the months that have transactions, newest first.
pub async fn months(config: Config) -> Result<Out<Vec<String>>> {
    let store = config.open_store().await;
    let months = available_months(store.document());
    let message = if months.is_empty() {
        "No transactions yet".to_string()
    } else {
        months.join("\n")
    };
    Ok(Out::new(message, months))
}

/// Renders rows as left-aligned columns with amounts aligned right.
fn table(rows: &[DisplayRow]) -> String {
    let cells: Vec<[String; 6]> = rows
        .iter()
        .map(|r| {
            [
                r.id.as_ref().map(|id| id.to_string()).unwrap_or_default(),
                r.kind.label().to_string(),
                r.date.clone(),
                r.description.clone(),
                r.amount.clone(),
                r.category.clone(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header = HEADERS.map(String::from);
    std::iter::once(&header)
        .chain(cells.iter())
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(col, cell)| pad(cell, widths[col], col == 4))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn pad(cell: &str, width: usize, right: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(cell.chars().count()));
    if right {
        format!("{fill}{cell}")
    } else {
        format!("{cell}{fill}")
    }
}
