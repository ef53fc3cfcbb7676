//! Dispatch for milestone-category events.
//!
//! Milestones are created, renamed, and deleted independently of any issue.
//! Mirrors the label dispatch: three branches keyed on the actual action
//! value, no implicit deletion.

use tracing::debug;

use crate::store::Gateway;
use crate::types::Milestone;
use crate::webhooks::events::{MilestoneAction, MilestoneEvent};

use super::{DispatchError, resolve_milestone, with_transaction};

/// Applies a milestone event to the store.
///
/// - `created` inserts the named milestone
/// - `edited` with a prior title renames the milestone found under that
///   prior title; without one (description or due-date edit) there is
///   nothing to store
/// - `deleted` removes the milestone found under its current title
///
/// # Errors
///
/// - [`DispatchError::UnresolvedReference`] when a rename or delete names a
///   milestone the store does not have
/// - [`DispatchError::Store`] on conflicts or gateway failure
pub fn process_milestone_event(
    gateway: &dyn Gateway,
    event: &MilestoneEvent,
) -> Result<(), DispatchError> {
    with_transaction(gateway, |tx| {
        match event.action {
            MilestoneAction::Created => {
                tx.insert_milestone(&Milestone::new(&event.title))?;
            }
            MilestoneAction::Edited => match &event.prior_title {
                Some(prior) => {
                    resolve_milestone(tx, prior)?;
                    tx.update_milestone(prior, &Milestone::new(&event.title))?;
                }
                None => {
                    debug!(
                        milestone = %event.title,
                        "milestone edit without rename; nothing to store"
                    );
                }
            },
            MilestoneAction::Deleted => {
                resolve_milestone(tx, &event.title)?;
                tx.delete_milestone(&event.title)?;
            }
        }
        Ok(())
    })
}
