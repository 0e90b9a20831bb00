//! Delete command handler.

use crate::args::DeleteArgs;
use crate::commands::{plural, Out};
use crate::model::TransactionId;
use crate::store::Deleted;
use crate::{Config, Result};
use tracing::{debug, warn};

/// Deletes the transactions named by id and the transactions matched by the given rows.
///
/// This is not all-or-nothing: ids and rows that match nothing are reported and skipped while
/// the rest are deleted. A snapshot of the document is saved to the backups directory before
/// anything is removed.
pub async fn delete(config: Config, args: DeleteArgs) -> Result<Out<Deleted>> {
    let mut store = config.open_store().await;
    let mut outcome = Deleted::default();

    if !args.ids().is_empty() {
        let ids: Vec<TransactionId> = args.ids().iter().map(|s| s.as_str().into()).collect();
        let deleted = store.delete(&ids).await?;
        outcome.removed.extend(deleted.removed);
        outcome.unmatched.extend(deleted.unmatched);
    }
    if !args.rows().is_empty() {
        let deleted = store.delete_rows(args.rows()).await?;
        outcome.removed.extend(deleted.removed);
        outcome.unmatched.extend(deleted.unmatched);
    }

    for unmatched in &outcome.unmatched {
        debug!("Nothing matched '{unmatched}'");
    }
    if outcome.removed.is_empty() {
        warn!("No transaction matched the selection");
    }

    let mut message = format!(
        "Deleted {}",
        plural(outcome.removed.len(), "transaction", "transactions")
    );
    if !outcome.unmatched.is_empty() {
        message.push_str(&format!(
            ", {} matched nothing: {}",
            plural(outcome.unmatched.len(), "selection", "selections"),
            outcome.unmatched.join(", ")
        ));
    }
    Ok(Out::new(message, outcome))
}
