use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the budget home, its subdirectories and an initial `config.json` with default
/// settings. An existing configuration is left untouched.
///
/// # Errors
/// - Returns an error if any file operations fail.
pub async fn init(budget_home: &Path) -> Result<Out<()>> {
    let config = Config::create(budget_home)
        .await
        .context("Unable to create the budget directory and config")?;
    Ok(format!(
        "The budget home is ready at {}. Data will be saved to {}",
        config.root().display(),
        config.data_path().display()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_is_repeatable() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("budget");
        init(&home).await.unwrap();
        let mut config = Config::load(&home).await.unwrap();
        config.add_category("Health").await.unwrap();

        let out = init(&home).await.unwrap();
        assert!(out.message().contains("ready"));
        let config = Config::load(&home).await.unwrap();
        assert_eq!(config.categories(), &["Health".to_string()]);
    }
}
