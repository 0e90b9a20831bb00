//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::model::{Kind, NewTransaction, TransactionId};
use crate::store::TransactionStore;
use crate::Config;
use tempfile::TempDir;

/// Test environment with an initialized budget home.
/// Holds TempDir to keep the directory alive for the duration of the test.
pub struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::create(temp_dir.path().join("budget")).await.unwrap();
        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Creates the environment and saves the income of 1000 and the 2.5 expense for Food used
    /// throughout the tests.
    pub async fn with_example_data() -> Self {
        let env = Self::new().await;
        env.add(NewTransaction::income("Salary", "1000", "2024-01-05"))
            .await;
        env.add(NewTransaction::expense("Coffee", "2.5", "2024-01-06", "Food"))
            .await;
        env
    }

    /// Loads the Config from disk, the way every CLI invocation does.
    pub async fn config(&self) -> Config {
        Config::load(self.config.root()).await.unwrap()
    }

    pub async fn store(&self) -> TransactionStore {
        self.config.open_store().await
    }

    pub async fn add(&self, input: NewTransaction) -> TransactionId {
        self.store().await.add(input).await.unwrap()
    }

    pub async fn count(&self, kind: Kind) -> usize {
        self.store().await.document().list(kind).len()
    }
}
