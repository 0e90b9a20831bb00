use crate::args::{CategoriesArgs, CategoriesCommand};
use crate::commands::Out;
use crate::filter::ALL;
use crate::{Config, Result};
use anyhow::bail;

/// Lists the known categories, or adds one. Added categories are saved in `config.json`.
pub async fn categories(mut config: Config, args: CategoriesArgs) -> Result<Out<Vec<String>>> {
    let store = config.open_store().await;
    let mut registry = config.category_registry(store.document());

    match args.command() {
        CategoriesCommand::List => {
            let names: Vec<String> = registry.iter().map(str::to_string).collect();
            Ok(Out::new(names.join("\n"), names))
        }
        CategoriesCommand::Add { name } => {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                bail!("The category name cannot be empty");
            }
            if trimmed == ALL {
                bail!("'{ALL}' is reserved for filters and cannot be a category");
            }
            if !registry.add(trimmed) {
                return Ok(format!("The category '{trimmed}' already exists").into());
            }
            config.add_category(trimmed).await?;
            let names: Vec<String> = registry.iter().map(str::to_string).collect();
            Ok(Out::new(format!("Added the category '{trimmed}'"), names))
        }
    }
}
