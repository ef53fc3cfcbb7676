//! Dispatch for label-category events.
//!
//! Labels are created, renamed, and deleted independently of any issue. The
//! three branches are keyed on the actual action value; an action outside
//! the known set is never treated as an implicit deletion.

use tracing::debug;

use crate::store::Gateway;
use crate::types::Label;
use crate::webhooks::events::{LabelAction, LabelEvent};

use super::{DispatchError, resolve_label, with_transaction};

/// Applies a label event to the store.
///
/// - `created` inserts the named label
/// - `edited` with a prior name renames the label found under that prior
///   name; without one (a color-only edit) there is nothing to store
/// - `deleted` removes the label found under its current name
///
/// # Errors
///
/// - [`DispatchError::UnresolvedReference`] when a rename or delete names a
///   label the store does not have
/// - [`DispatchError::Store`] on conflicts or gateway failure
pub fn process_label_event(gateway: &dyn Gateway, event: &LabelEvent) -> Result<(), DispatchError> {
    with_transaction(gateway, |tx| {
        match event.action {
            LabelAction::Created => {
                tx.insert_label(&Label::new(&event.name))?;
            }
            LabelAction::Edited => match &event.prior_name {
                Some(prior) => {
                    resolve_label(tx, prior)?;
                    tx.update_label(prior, &Label::new(&event.name))?;
                }
                None => {
                    // Color edits arrive through the same action; the name is
                    // all we store, so there is nothing to update.
                    debug!(label = %event.name, "label edit without rename; nothing to store");
                }
            },
            LabelAction::Deleted => {
                resolve_label(tx, &event.name)?;
                tx.delete_label(&event.name)?;
            }
        }
        Ok(())
    })
}
