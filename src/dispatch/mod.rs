//! Event dispatch: maps normalized events onto entity mutations.
//!
//! Each category gets its own small state machine:
//!
//! | Module | Entities driven |
//! |--------|-----------------|
//! | [`issue`] | issue lifecycle, title, milestone reference, label set |
//! | [`label`] | the label set itself (create/rename/delete) |
//! | [`milestone`] | the milestone set itself (create/rename/delete) |
//!
//! Every dispatch runs inside one gateway transaction: the entity mutation
//! and, for issue events, the event log append either both persist or
//! neither does. Errors roll the transaction back and surface to the caller;
//! nothing here retries; the tracker's own redelivery is the recovery
//! mechanism.

mod issue;
mod label;
mod milestone;

pub use issue::process_issue_event;
pub use label::process_label_event;
pub use milestone::process_milestone_event;

use thiserror::Error;
use tracing::warn;

use crate::store::{Gateway, StoreError, Transaction};
use crate::types::{Issue, IssueNumber, Label, Milestone};

/// Errors surfaced at the dispatcher boundary.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The notification references an issue we have never stored.
    #[error("issue {0} not found")]
    IssueNotFound(IssueNumber),

    /// A milestone or label named by the notification does not exist in the
    /// store. Distinct from a store failure: proceeding would leave an issue
    /// referencing a nonexistent entity, so the transaction is abandoned and
    /// the tracker's redelivery gets another chance after the missing entity
    /// arrives.
    #[error("unresolved {kind} reference: {name:?}")]
    UnresolvedReference { kind: &'static str, name: String },

    /// The normalized event lacks the detail its action requires.
    #[error("event is missing its {0}")]
    MissingDetail(&'static str),

    /// The gateway failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Runs `apply` inside a transaction: commit on success, rollback on error.
fn with_transaction<T>(
    gateway: &dyn Gateway,
    apply: impl FnOnce(&mut dyn Transaction) -> Result<T, DispatchError>,
) -> Result<T, DispatchError> {
    let mut tx = gateway.begin()?;
    match apply(tx.as_mut()) {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!(error = %rollback_err, "rollback failed after dispatch error");
            }
            Err(err)
        }
    }
}

/// Fetches an issue or fails with [`DispatchError::IssueNotFound`].
fn require_issue(tx: &mut dyn Transaction, number: IssueNumber) -> Result<Issue, DispatchError> {
    tx.issue_by_number(number)?
        .ok_or(DispatchError::IssueNotFound(number))
}

/// Resolves a label by exact name or fails with an unresolved reference.
fn resolve_label(tx: &mut dyn Transaction, name: &str) -> Result<Label, DispatchError> {
    tx.label_by_name(name)?
        .ok_or_else(|| DispatchError::UnresolvedReference {
            kind: "label",
            name: name.to_owned(),
        })
}

/// Resolves a milestone by exact title or fails with an unresolved reference.
fn resolve_milestone(tx: &mut dyn Transaction, title: &str) -> Result<Milestone, DispatchError> {
    tx.milestone_by_title(title)?
        .ok_or_else(|| DispatchError::UnresolvedReference {
            kind: "milestone",
            name: title.to_owned(),
        })
}
