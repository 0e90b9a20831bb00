//! Rotating snapshots of the budget document, kept in the `.backups` directory of the budget home.

use crate::store::Document;
use crate::{utils, Result};
use anyhow::Context;
use chrono::Local;
use std::path::{Path, PathBuf};

/// Prefix for the snapshot taken before a delete removes anything.
pub const PRE_DELETE: &str = "pre-delete";

/// Prefix for the copy of a document that could not be parsed, taken before it is overwritten.
pub const CORRUPT: &str = "corrupt";

const EXTENSION: &str = "json";

/// Creates backup files named `{prefix}.YYYY-MM-DD-NNN.json` and keeps at most `backup_copies` of
/// them per prefix. A `backup_copies` of zero turns backups off. Obtain one with
/// `Config::backup()`.
#[derive(Debug, Clone)]
pub struct Backup {
    backups_dir: PathBuf,
    backup_copies: u32,
}

impl Backup {
    pub fn new(backups_dir: impl Into<PathBuf>, backup_copies: u32) -> Self {
        Self {
            backups_dir: backups_dir.into(),
            backup_copies,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backup_copies > 0
    }

    /// Writes `document` as pretty JSON under a new sequence number, then rotates. Returns the
    /// path of the new file, or `None` when backups are off.
    pub async fn save_json(&self, prefix: &str, document: &Document) -> Result<Option<PathBuf>> {
        if !self.is_enabled() {
            return Ok(None);
        }
        let json = serde_json::to_string_pretty(document)
            .context("Failed to serialize the budget document for backup")?;
        let path = self.next_path(prefix).await?;
        utils::write(&path, json).await?;
        self.rotate(prefix).await?;
        Ok(Some(path))
    }

    /// Copies `source` byte for byte, for files that cannot be parsed as a `Document`.
    pub async fn copy_file(&self, prefix: &str, source: &Path) -> Result<Option<PathBuf>> {
        if !self.is_enabled() {
            return Ok(None);
        }
        let path = self.next_path(prefix).await?;
        utils::copy(source, &path).await?;
        self.rotate(prefix).await?;
        Ok(Some(path))
    }

    async fn next_path(&self, prefix: &str) -> Result<PathBuf> {
        utils::make_dir(&self.backups_dir).await?;
        let date = today();
        let seq = self.next_sequence_number(prefix, &date).await?;
        Ok(self
            .backups_dir
            .join(format!("{prefix}.{date}-{seq:03}.{EXTENSION}")))
    }

    async fn backup_names(&self, prefix: &str) -> Result<Vec<(PathBuf, String)>> {
        let mut files = Vec::new();
        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if is_backup_file(&name, prefix) {
                files.push((entry.path(), name));
            }
        }
        Ok(files)
    }

    async fn next_sequence_number(&self, prefix: &str, date: &str) -> Result<u32> {
        let max_seq = self
            .backup_names(prefix)
            .await?
            .iter()
            .filter_map(|(_, name)| parse_sequence_number(name, prefix, date))
            .max()
            .unwrap_or(0);
        Ok(max_seq + 1)
    }

    /// Deletes the oldest files for `prefix` beyond `backup_copies`, ordered by date and then by
    /// sequence number.
    async fn rotate(&self, prefix: &str) -> Result<()> {
        let mut files: Vec<((String, u32), PathBuf)> = self
            .backup_names(prefix)
            .await?
            .into_iter()
            .filter_map(|(path, name)| Some((parse_backup_key(&name, prefix)?, path)))
            .collect();
        files.sort();
        let to_delete = files.len().saturating_sub(self.backup_copies as usize);
        for (_, path) in files.into_iter().take(to_delete) {
            utils::remove(&path).await?;
        }
        Ok(())
    }
}

fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// The `NNN` of `{prefix}.{date}-NNN.json`, if `filename` has that shape.
fn parse_sequence_number(filename: &str, prefix: &str, date: &str) -> Option<u32> {
    filename
        .strip_prefix(&format!("{prefix}.{date}-"))?
        .strip_suffix(&format!(".{EXTENSION}"))?
        .parse()
        .ok()
}

/// The `(date, NNN)` of `{prefix}.{date}-NNN.json`.
fn parse_backup_key(filename: &str, prefix: &str) -> Option<(String, u32)> {
    let stem = filename
        .strip_prefix(&format!("{prefix}."))?
        .strip_suffix(&format!(".{EXTENSION}"))?;
    let (date, seq) = stem.rsplit_once('-')?;
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some((date.to_string(), seq.parse().ok()?))
}

fn is_backup_file(filename: &str, prefix: &str) -> bool {
    filename.starts_with(&format!("{prefix}.")) && filename.ends_with(&format!(".{EXTENSION}"))
}
