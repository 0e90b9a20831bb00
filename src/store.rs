//! The transaction store: the in-memory income and expense lists and the JSON document they are
//! persisted to.
//!
//! The document is loaded once and rewritten in full after every mutation. Example document:
//! ```json
//! {
//!     "income": [
//!         { "id": "0d5c…", "description": "Salary", "amount": 1000, "date": "2024-01-05" }
//!     ],
//!     "expenses": [
//!         { "id": "8a41…", "description": "Coffee", "amount": 2.5, "date": "2024-01-06", "category": "Food" }
//!     ]
//! }
//! ```

use crate::backup::{Backup, PRE_DELETE};
use crate::model::{DisplayRow, Kind, NewTransaction, Transaction, TransactionId};
use crate::{utils, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The persisted form of the store.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    income: Vec<Transaction>,
    #[serde(default)]
    expenses: Vec<Transaction>,
}

impl Document {
    pub fn income(&self) -> &[Transaction] {
        &self.income
    }

    pub fn expenses(&self) -> &[Transaction] {
        &self.expenses
    }

    pub fn list(&self, kind: Kind) -> &[Transaction] {
        match kind {
            Kind::Income => &self.income,
            Kind::Expense => &self.expenses,
        }
    }

    fn list_mut(&mut self, kind: Kind) -> &mut Vec<Transaction> {
        match kind {
            Kind::Income => &mut self.income,
            Kind::Expense => &mut self.expenses,
        }
    }

    /// Every record tagged with its kind: income first, then expenses, each in storage order.
    pub fn entries(&self) -> impl Iterator<Item = (Kind, &Transaction)> {
        self.income
            .iter()
            .map(|t| (Kind::Income, t))
            .chain(self.expenses.iter().map(|t| (Kind::Expense, t)))
    }

    pub fn get(&self, id: &TransactionId) -> Option<(Kind, &Transaction)> {
        self.entries().find(|(_, t)| t.id() == id)
    }

    pub fn len(&self) -> usize {
        self.income.len() + self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a validated transaction to the list for `kind`.
    pub(crate) fn push(&mut self, kind: Kind, transaction: Transaction) {
        self.list_mut(kind).push(transaction);
    }

    /// Gives an id to every record that lacks one. Returns how many were assigned.
    fn assign_missing_ids(&mut self) -> usize {
        let mut count = 0;
        for t in self.income.iter_mut().chain(self.expenses.iter_mut()) {
            if t.id.is_unassigned() {
                t.id = TransactionId::generate();
                count += 1;
            }
        }
        count
    }

    fn to_json(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)
            .context("Unable to serialize the budget document")?;
        Ok(buf)
    }
}

/// What happened when the document was read.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum LoadOutcome {
    Loaded,
    /// There was no document; the store starts empty.
    Missing,
    /// The document could not be read or parsed; the store starts empty.
    Corrupt(String),
}

/// The result of a delete batch.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize)]
pub struct Deleted {
    /// The records that were removed, in the order they were selected.
    pub removed: Vec<Transaction>,
    /// The selections that did not resolve to any record.
    pub unmatched: Vec<String>,
}

/// Owns the income and expense lists and writes them to `path`.
#[derive(Debug)]
pub struct TransactionStore {
    path: PathBuf,
    document: Document,
    outcome: LoadOutcome,
    synced: bool,
    backup: Option<Backup>,
}

impl TransactionStore {
    /// Reads the document at `path`. This never fails: a missing or malformed document results in
    /// an empty store and the reason is available from `outcome()`.
    ///
    /// Records without an id are given one and the document is rewritten immediately so that the
    /// ids stay stable.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (document, outcome) = match read_document(&path).await {
            Ok(Some(document)) => (document, LoadOutcome::Loaded),
            Ok(None) => {
                debug!("No budget document at {}, starting empty", path.display());
                (Document::default(), LoadOutcome::Missing)
            }
            Err(e) => {
                warn!("Unable to load the budget document, starting empty: {e:#}");
                (Document::default(), LoadOutcome::Corrupt(format!("{e:#}")))
            }
        };

        let mut store = Self {
            path,
            document,
            outcome,
            synced: true,
            backup: None,
        };

        let assigned = store.document.assign_missing_ids();
        if assigned > 0 {
            info!("Assigned ids to {assigned} transactions that did not have one");
            store.synced = false;
            if let Err(e) = store.save().await {
                warn!("Unable to save the newly assigned ids: {e:#}");
            }
        }
        store
    }

    /// Snapshot the document with `backup` before each delete that removes something.
    pub fn with_backup(mut self, backup: Backup) -> Self {
        self.backup = Some(backup);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn outcome(&self) -> &LoadOutcome {
        &self.outcome
    }

    /// False when the in-memory data has changes that have not been written.
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Writes the whole document. On failure the in-memory data is kept and marked as unsynced.
    pub async fn save(&mut self) -> Result<()> {
        let json = self.document.to_json()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            utils::make_dir(parent).await?;
        }
        match utils::write_atomic(&self.path, json).await {
            Ok(()) => {
                self.synced = true;
                debug!("Saved {} transactions to {}", self.document.len(), self.path.display());
                Ok(())
            }
            Err(e) => {
                self.synced = false;
                Err(e).context("Unable to save the budget document, changes are only in memory")
            }
        }
    }

    /// Validates `input`, appends it and saves. Nothing changes if validation fails; the error
    /// then wraps a `ValidationError`.
    pub async fn add(&mut self, input: NewTransaction) -> Result<TransactionId> {
        let kind = input.kind;
        let transaction = input.validate()?;
        let id = transaction.id().clone();
        debug!("Adding {kind} {id}");
        self.document.push(kind, transaction);
        self.synced = false;
        self.save().await?;
        Ok(id)
    }

    /// Removes the records with the given ids. Unknown ids are reported in `unmatched` and do not
    /// stop the others from being removed. The document is saved once if anything was removed.
    pub async fn delete(&mut self, ids: &[TransactionId]) -> Result<Deleted> {
        let mut seen = BTreeSet::new();
        let mut selected = Vec::new();
        let mut unmatched = Vec::new();
        for id in ids.iter().filter(|id| seen.insert(*id)) {
            let found = [Kind::Income, Kind::Expense].into_iter().find_map(|kind| {
                self.document
                    .list(kind)
                    .iter()
                    .position(|t| t.id() == id)
                    .map(|ix| (kind, ix))
            });
            match found {
                Some(slot) => selected.push(slot),
                None => {
                    debug!("No transaction with id {id}");
                    unmatched.push(id.to_string());
                }
            }
        }
        self.apply_delete(selected, unmatched).await
    }

    /// Removes the records that the given table rows were produced from.
    ///
    /// Each row is resolved against its kind's list with `DisplayRow::matches`, skipping records
    /// already claimed by an earlier row of the same batch, so that two identical-looking rows
    /// remove two records only if two such records exist. Unresolved rows are reported in
    /// `unmatched`. The document is saved once if anything was removed.
    pub async fn delete_rows(&mut self, rows: &[DisplayRow]) -> Result<Deleted> {
        let mut claimed: BTreeMap<Kind, BTreeSet<usize>> = BTreeMap::new();
        let mut selected = Vec::new();
        let mut unmatched = Vec::new();
        for row in rows {
            let taken = claimed.entry(row.kind).or_default();
            let found = self
                .document
                .list(row.kind)
                .iter()
                .enumerate()
                .find(|(ix, t)| !taken.contains(ix) && row.matches(row.kind, t))
                .map(|(ix, _)| ix);
            match found {
                Some(ix) => {
                    taken.insert(ix);
                    selected.push((row.kind, ix));
                }
                None => {
                    debug!("No transaction matches {row:?}");
                    unmatched.push(format!(
                        "{}|{}|{}|{}|{}",
                        row.kind, row.date, row.description, row.amount, row.category
                    ));
                }
            }
        }
        self.apply_delete(selected, unmatched).await
    }

    /// Removes the `(kind, index)` selections, highest index first within each list so that
    /// earlier removals do not shift later ones.
    async fn apply_delete(
        &mut self,
        selected: Vec<(Kind, usize)>,
        unmatched: Vec<String>,
    ) -> Result<Deleted> {
        if selected.is_empty() {
            return Ok(Deleted {
                removed: Vec::new(),
                unmatched,
            });
        }

        if let Some(backup) = &self.backup {
            if let Some(path) = backup.save_json(PRE_DELETE, &self.document).await? {
                debug!("Saved pre-delete backup to {}", path.display());
            }
        }

        let mut descending = selected.clone();
        descending.sort_by(|a, b| b.cmp(a));
        let mut taken: HashMap<(Kind, usize), Transaction> = HashMap::new();
        for (kind, ix) in descending {
            let list = self.document.list_mut(kind);
            if ix < list.len() {
                taken.insert((kind, ix), list.remove(ix));
            }
        }
        let removed = selected
            .iter()
            .filter_map(|slot| taken.remove(slot))
            .collect();

        self.synced = false;
        self.save().await?;
        Ok(Deleted { removed, unmatched })
    }
}

/// Reads and parses the document. `Ok(None)` means there is no file.
async fn read_document(path: &Path) -> Result<Option<Document>> {
    if !tokio::fs::try_exists(path)
        .await
        .with_context(|| format!("Unable to check for {}", path.display()))?
    {
        return Ok(None);
    }
    let content = utils::read(path).await?;
    let document = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse the budget document at {}", path.display()))?;
    Ok(Some(document))
}
