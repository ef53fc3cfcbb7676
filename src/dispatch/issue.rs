//! Dispatch for issue-category events.
//!
//! The issue state machine, keyed by normalized action:
//!
//! | Action | Effect |
//! |--------|--------|
//! | `opened` | create the issue, open, milestone resolved by title |
//! | `edited` | overwrite the title |
//! | `closed` | mark closed |
//! | `reopened` | mark open |
//! | `milestoned` | set the milestone reference (resolved by title) |
//! | `unmilestoned` | clear the milestone reference |
//! | `labeled` | add the named label (resolved by name) |
//! | `unlabeled` | remove the named label |
//!
//! Every transition appends exactly one event log record in the same
//! transaction. Each action is routed by its own match arm; nothing is
//! inferred from "not being" some other action.

use crate::store::{Gateway, Transaction};
use crate::types::{EventId, Issue, NewEvent};
use crate::webhooks::events::{IssueAction, IssueEvent};

use super::{DispatchError, require_issue, resolve_label, resolve_milestone, with_transaction};

/// Applies an issue event to the store and appends its log record.
///
/// Runs in one transaction; on any error the transaction rolls back and
/// neither the entity mutation nor the event record persists.
///
/// # Errors
///
/// - [`DispatchError::IssueNotFound`] when a non-`opened` action names an
///   issue we never stored
/// - [`DispatchError::UnresolvedReference`] when the named milestone or
///   label is absent from the store
/// - [`DispatchError::Store`] when the gateway fails
pub fn process_issue_event(
    gateway: &dyn Gateway,
    event: &IssueEvent,
) -> Result<EventId, DispatchError> {
    with_transaction(gateway, |tx| {
        match event.action {
            IssueAction::Opened => open_issue(tx, event)?,
            IssueAction::Edited => retitle_issue(tx, event)?,
            IssueAction::Closed => set_issue_status(tx, event, false)?,
            IssueAction::Reopened => set_issue_status(tx, event, true)?,
            IssueAction::Milestoned => assign_milestone(tx, event)?,
            IssueAction::Unmilestoned => clear_milestone(tx, event)?,
            IssueAction::Labeled => add_label(tx, event)?,
            IssueAction::Unlabeled => remove_label(tx, event)?,
        }

        let id = tx.append_event(NewEvent {
            issue: event.number,
            actor: event.actor.clone(),
            action: event.action,
            detail: event.detail.clone(),
            received_at: event.received_at,
        })?;
        Ok(id)
    })
}

/// Creates a new, open issue. The milestone (when named) must already exist.
fn open_issue(tx: &mut dyn Transaction, event: &IssueEvent) -> Result<(), DispatchError> {
    if let Some(title) = &event.milestone {
        resolve_milestone(tx, title)?;
    }
    let issue = Issue::opened(
        event.number,
        event.title.clone(),
        event.created_at,
        event.milestone.clone(),
    );
    tx.insert_issue(&issue)?;
    Ok(())
}

/// Overwrites the issue's title with the one this notification carries.
fn retitle_issue(tx: &mut dyn Transaction, event: &IssueEvent) -> Result<(), DispatchError> {
    let mut issue = require_issue(tx, event.number)?;
    issue.title = event.title.clone();
    tx.update_issue(&issue)?;
    Ok(())
}

/// Toggles the open/closed status.
fn set_issue_status(
    tx: &mut dyn Transaction,
    event: &IssueEvent,
    is_open: bool,
) -> Result<(), DispatchError> {
    let mut issue = require_issue(tx, event.number)?;
    issue.is_open = is_open;
    tx.update_issue(&issue)?;
    Ok(())
}

/// Points the issue at the named milestone.
fn assign_milestone(tx: &mut dyn Transaction, event: &IssueEvent) -> Result<(), DispatchError> {
    let title = event
        .milestone
        .as_deref()
        .ok_or(DispatchError::MissingDetail("milestone"))?;
    resolve_milestone(tx, title)?;

    let mut issue = require_issue(tx, event.number)?;
    issue.milestone = Some(title.to_owned());
    tx.update_issue(&issue)?;
    Ok(())
}

/// Detaches the issue from its milestone.
///
/// The tracker reports a milestone change as a remove/add pair, so an issue
/// with no milestone here is the expected half-way state, not a problem.
fn clear_milestone(tx: &mut dyn Transaction, event: &IssueEvent) -> Result<(), DispatchError> {
    let mut issue = require_issue(tx, event.number)?;
    issue.milestone = None;
    tx.update_issue(&issue)?;
    Ok(())
}

/// Adds the named label to the issue's label set.
fn add_label(tx: &mut dyn Transaction, event: &IssueEvent) -> Result<(), DispatchError> {
    let name = event
        .label_name()
        .ok_or(DispatchError::MissingDetail("label"))?;
    resolve_label(tx, name)?;

    let mut issue = require_issue(tx, event.number)?;
    issue.labels.insert(name.to_owned());
    tx.update_issue(&issue)?;
    Ok(())
}

/// Removes the named label from the issue's label set.
fn remove_label(tx: &mut dyn Transaction, event: &IssueEvent) -> Result<(), DispatchError> {
    let name = event
        .label_name()
        .ok_or(DispatchError::MissingDetail("label"))?;
    resolve_label(tx, name)?;

    let mut issue = require_issue(tx, event.number)?;
    issue.labels.remove(name);
    tx.update_issue(&issue)?;
    Ok(())
}
