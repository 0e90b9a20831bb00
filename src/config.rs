//! Configuration file handling for the budget tracker.
//!
//! The configuration file is stored at `$BUDGET_HOME/config.json`. It holds the location of the
//! budget document, backup settings, the display currency, the expense categories and the
//! settings of the chat assistant. Every field is optional; a missing file means defaults.

use crate::backup::{Backup, CORRUPT};
use crate::model::{CategoryRegistry, Currency, DEFAULT_CATEGORIES};
use crate::store::{Document, LoadOutcome, TransactionStore};
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const APP_NAME: &str = "budget";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
const SECRETS: &str = ".secrets";
const BACKUPS: &str = ".backups";
const CONFIG_JSON: &str = "config.json";
const DATA_FILE: &str = "budget_data.json";
const API_KEY_FILE: &str = "api_key";

pub const OPENROUTER_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-r1-0528";
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant integrated into a budget tracking application. Answer concisely.";

/// The `Config` object represents the configuration of the app. You instantiate it with the path
/// to `$BUDGET_HOME` and it loads `$BUDGET_HOME/config.json` from there. It provides the paths of
/// the other items kept in the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the home directory and its subdirectories and writes an initial `config.json`.
    /// An existing `config.json` is kept as it is.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let config = Self::load(dir).await?;
        if config.config_path.is_file() {
            debug!("Keeping the existing {}", config.config_path.display());
        } else {
            config.config_file.save(&config.config_path).await?;
        }
        Ok(config)
    }

    /// Ensures that `budget_home` and its subdirectories exist and loads `config.json`, falling
    /// back to the defaults when the file does not exist.
    pub async fn load(budget_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = budget_home.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the budget home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let backups = root.join(BACKUPS);
        utils::make_dir(&backups).await?;
        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = if config_path.is_file() {
            ConfigFile::load(&config_path).await?
        } else {
            debug!("No config file at {}, using defaults", config_path.display());
            ConfigFile::default()
        };

        Ok(Self {
            root,
            backups,
            secrets,
            config_path,
            config_file,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    /// The budget document. A relative `data_file` is resolved against the home directory.
    pub fn data_path(&self) -> PathBuf {
        let p = self
            .config_file
            .data_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DATA_FILE));
        if p.is_absolute() {
            p
        } else {
            self.root.join(p)
        }
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    pub fn backup(&self) -> Backup {
        Backup::new(&self.backups, self.backup_copies())
    }

    pub fn currency(&self) -> &Currency {
        &self.config_file.currency
    }

    pub fn chat(&self) -> &ChatConfig {
        &self.config_file.chat
    }

    /// Categories added by the user, in the order they were added.
    pub fn categories(&self) -> &[String] {
        &self.config_file.categories
    }

    pub fn default_categories(&self) -> &[String] {
        &self.config_file.default_categories
    }

    /// Loads the budget document and attaches the backup settings to the store.
    ///
    /// A document that cannot be parsed is copied into the backups directory first, because the
    /// next save replaces it.
    pub async fn open_store(&self) -> TransactionStore {
        let path = self.data_path();
        let store = TransactionStore::load(&path).await;
        if let LoadOutcome::Corrupt(reason) = store.outcome() {
            match self.backup().copy_file(CORRUPT, &path).await {
                Ok(Some(copy)) => warn!(
                    "The budget document is unreadable ({reason}). A copy was saved to {}",
                    copy.display()
                ),
                Ok(None) => warn!("The budget document is unreadable ({reason})"),
                Err(e) => warn!("Unable to back up the unreadable budget document: {e:#}"),
            }
        }
        store.with_backup(self.backup())
    }

    /// The defaults, the user's additions and every category used in `document`.
    pub fn category_registry(&self, document: &Document) -> CategoryRegistry {
        CategoryRegistry::load(
            document,
            self.default_categories()
                .iter()
                .chain(self.categories().iter()),
        )
    }

    /// Records a user-added category in `config.json`. Returns `false` if it was already listed.
    pub async fn add_category(&mut self, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() || self.config_file.categories.iter().any(|c| c == name) {
            return Ok(false);
        }
        self.config_file.categories.push(name.to_string());
        self.config_file.save(&self.config_path).await?;
        Ok(true)
    }

    /// The chat API key, from the environment variable named by `chat.api_key_env` or else from
    /// `$BUDGET_HOME/.secrets/api_key`.
    pub async fn api_key(&self) -> Result<String> {
        let from_env = std::env::var(&self.chat().api_key_env).ok();
        self.resolve_api_key(from_env).await
    }

    async fn resolve_api_key(&self, from_env: Option<String>) -> Result<String> {
        if let Some(key) = from_env.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()) {
            return Ok(key);
        }
        let key_path = self.secrets.join(API_KEY_FILE);
        if key_path.is_file() {
            let key = utils::read(&key_path).await?.trim().to_string();
            if !key.is_empty() {
                return Ok(key);
            }
        }
        bail!(
            "No API key for the chat assistant. Set {} or write the key to {}",
            self.chat().api_key_env,
            key_path.display()
        )
    }
}

/// The settings of the chat assistant.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    /// The chat-completions URL.
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    /// The number of user and assistant turns kept between requests.
    pub max_history: usize,
    /// The name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Sent as the `HTTP-Referer` header.
    pub referer: String,
    /// Sent as the `X-Title` header.
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    pub system_prompt: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: OPENROUTER_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 1000,
            max_history: 10,
            api_key_env: API_KEY_ENV.to_string(),
            referer: "budget_tracker_app".to_string(),
            title: "Budget Tracker".to_string(),
            timeout_secs: None,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "budget",
///   "config_version": 1,
///   "backup_copies": 5,
///   "currency": { "symbol": "FCFA", "decimals": 0 },
///   "categories": ["Health"],
///   "default_categories": ["Bills", "Entertainment", "Food", "Other", "Rent", "Transport"],
///   "chat": { "model": "deepseek/deepseek-r1-0528", "max_history": 10 }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
struct ConfigFile {
    /// Application name, should always be "budget"
    app_name: String,

    config_version: u8,

    /// Path to the budget document, relative to the home directory or absolute.
    /// Defaults to `$BUDGET_HOME/budget_data.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    data_file: Option<PathBuf>,

    /// Number of backup copies to keep per kind of backup
    backup_copies: u32,

    currency: Currency,

    /// Categories added by the user
    categories: Vec<String>,

    default_categories: Vec<String>,

    chat: ChatConfig,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            data_file: None,
            backup_copies: BACKUP_COPIES,
            currency: Currency::default(),
            categories: Vec::new(),
            default_categories: DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
            chat: ChatConfig::default(),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app.
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;

        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write_atomic(p, data)
            .await
            .context("Unable to write config file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewTransaction;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("budget_home");
        let config = Config::create(&home).await.unwrap();

        assert!(config.backups().is_dir());
        assert!(config.secrets().is_dir());
        assert!(config.config_path().is_file());
        assert_eq!(config.data_path(), config.root().join(DATA_FILE));
        assert_eq!(config.currency(), &Currency::default());

        let loaded = Config::load(&home).await.unwrap();
        assert_eq!(loaded.config_file, config.config_file);
    }

    #[tokio::test]
    async fn test_load_without_config_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path()).await.unwrap();
        assert!(!config.config_path().exists());
        assert_eq!(config.backup_copies(), BACKUP_COPIES);
        assert_eq!(config.chat().max_history, 10);
        assert_eq!(config.chat().endpoint, OPENROUTER_ENDPOINT);
        assert_eq!(config.default_categories().len(), DEFAULT_CATEGORIES.len());
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_JSON);
        let json = r#"{
            "app_name": "budget",
            "data_file": "/tmp/elsewhere.json",
            "currency": { "symbol": "EUR", "decimals": 2 },
            "chat": { "model": "some/model" }
        }"#;
        utils::write(&path, json).await.unwrap();

        let config = Config::load(dir.path()).await.unwrap();
        assert_eq!(config.data_path(), PathBuf::from("/tmp/elsewhere.json"));
        assert_eq!(config.currency().symbol, "EUR");
        assert_eq!(config.currency().decimals, 2);
        assert_eq!(config.chat().model, "some/model");
        assert_eq!(config.chat().max_tokens, 1000);
        assert_eq!(config.backup_copies(), BACKUP_COPIES);
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_JSON);
        utils::write(&path, r#"{ "app_name": "other_app" }"#)
            .await
            .unwrap();
        let err = ConfigFile::load(&path).await.unwrap_err();
        assert!(err.to_string().contains("Invalid app_name"));
    }

    #[test]
    fn test_config_file_serialization_omits_none_fields() {
        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert!(!json.contains("data_file"));
        assert!(!json.contains("timeout_secs"));
    }

    #[tokio::test]
    async fn test_add_category_persists() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::create(dir.path()).await.unwrap();
        assert!(config.add_category(" Health ").await.unwrap());
        assert!(!config.add_category("Health").await.unwrap());
        assert!(!config.add_category("  ").await.unwrap());

        let loaded = Config::load(dir.path()).await.unwrap();
        assert_eq!(loaded.categories(), &["Health".to_string()]);

        let mut document = Document::default();
        document.push(
            crate::model::Kind::Expense,
            NewTransaction::expense("Book", "12", "2024-02-02", "Education")
                .validate()
                .unwrap(),
        );
        let registry = loaded.category_registry(&document);
        assert!(registry.contains("Health"));
        assert!(registry.contains("Education"));
        assert!(registry.contains("Food"));
    }

    #[tokio::test]
    async fn test_api_key_sources() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path()).await.unwrap();

        assert!(config.resolve_api_key(None).await.is_err());
        assert!(config.resolve_api_key(Some("  ".into())).await.is_err());
        assert_eq!(
            config.resolve_api_key(Some("from-env".into())).await.unwrap(),
            "from-env"
        );

        utils::write(config.secrets().join(API_KEY_FILE), "from-file\n")
            .await
            .unwrap();
        assert_eq!(config.resolve_api_key(None).await.unwrap(), "from-file");
        assert_eq!(
            config.resolve_api_key(Some("from-env".into())).await.unwrap(),
            "from-env"
        );
    }

    #[tokio::test]
    async fn test_open_store_backs_up_corrupt_document() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path()).await.unwrap();
        utils::write(config.data_path(), "[1, 2").await.unwrap();

        let store = config.open_store().await;
        assert!(store.document().is_empty());

        let mut entries = utils::read_dir(config.backups()).await.unwrap();
        let entry = entries.next_entry().await.unwrap().unwrap();
        let name = entry.file_name().to_string_lossy().to_string();
        assert!(name.starts_with("corrupt."), "{name}");
        assert_eq!(utils::read(&entry.path()).await.unwrap(), "[1, 2");
    }
}
