use crate::args::AddArgs;
use crate::commands::Out;
use crate::model::{DisplayRow, Kind, NewTransaction, DATE_FORMAT};
use crate::{Config, Result};
use anyhow::Context;
use chrono::Local;
use tracing::info;

/// Validates and saves a new transaction. The date defaults to today.
///
/// # Errors
/// - A `ValidationError` if the input breaks a rule. Nothing is saved in that case.
/// - Any error from writing the document.
pub async fn add(config: Config, args: AddArgs) -> Result<Out<DisplayRow>> {
    let date = args
        .date()
        .map(str::to_string)
        .unwrap_or_else(|| Local::now().format(DATE_FORMAT).to_string());
    let input = NewTransaction {
        kind: args.kind(),
        description: args.description().to_string(),
        amount: args.amount().to_string(),
        date,
        category: args.category().map(str::to_string),
    };

    let mut store = config.open_store().await;
    let registry = config.category_registry(store.document());
    if let Some(category) = input.category.as_deref().map(str::trim) {
        if input.kind == Kind::Expense
            && !category.is_empty()
            && !registry.contains(category)
        {
            info!("'{category}' is a new category");
        }
    }

    let id = store.add(input).await?;
    let (kind, transaction) = store
        .document()
        .get(&id)
        .with_context(|| format!("The new transaction {id} is missing from the store"))?;
    let row = DisplayRow::new(kind, transaction, config.currency());
    Ok(Out::new(
        format!(
            "Added {} '{}' of {} on {} ({id})",
            kind,
            row.description,
            row.amount,
            row.date
        ),
        row,
    ))
}
