//! Normalized webhook event records.
//!
//! This module defines the typed, minimal representations the parser distills
//! raw tracker payloads into. Downstream dispatch works only on these records;
//! the payload's action-dependent shape stops here.
//!
//! # Event Types
//!
//! - [`IssueEvent`] - lifecycle, title, milestone, and label changes on an issue
//! - [`LabelEvent`] - create/rename/delete of a label itself
//! - [`MilestoneEvent`] - create/rename/delete of a milestone itself

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{EventDetail, IssueNumber};

/// Action performed on an issue that the system persists.
///
/// These are the "desirable" actions; everything else the tracker may send
/// (assigned, body-only edits, ...) is filtered out by classification before
/// an [`IssueEvent`] is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueAction {
    /// Issue was opened.
    Opened,
    /// Issue was edited (only title edits reach dispatch).
    Edited,
    /// Issue was closed.
    Closed,
    /// Issue was reopened.
    Reopened,
    /// A milestone was set on the issue.
    Milestoned,
    /// The issue's milestone was removed.
    ///
    /// A milestone *change* arrives as an unmilestoned/milestoned pair, so
    /// this action routinely precedes a matching [`IssueAction::Milestoned`].
    Unmilestoned,
    /// A label was added to the issue.
    Labeled,
    /// A label was removed from the issue.
    Unlabeled,
}

impl IssueAction {
    /// Parses the tracker's action string. Unknown actions return `None`.
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "opened" => Some(IssueAction::Opened),
            "edited" => Some(IssueAction::Edited),
            "closed" => Some(IssueAction::Closed),
            "reopened" => Some(IssueAction::Reopened),
            "milestoned" => Some(IssueAction::Milestoned),
            "unmilestoned" => Some(IssueAction::Unmilestoned),
            "labeled" => Some(IssueAction::Labeled),
            "unlabeled" => Some(IssueAction::Unlabeled),
            _ => None,
        }
    }

    /// The tracker's wire name for the action.
    pub fn as_str(self) -> &'static str {
        match self {
            IssueAction::Opened => "opened",
            IssueAction::Edited => "edited",
            IssueAction::Closed => "closed",
            IssueAction::Reopened => "reopened",
            IssueAction::Milestoned => "milestoned",
            IssueAction::Unmilestoned => "unmilestoned",
            IssueAction::Labeled => "labeled",
            IssueAction::Unlabeled => "unlabeled",
        }
    }
}

/// A normalized issue-category event.
///
/// Action-agnostic downstream: every field is populated the same way
/// regardless of which action produced the record, and the action-dependent
/// remainder lives in `detail`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueEvent {
    /// The tracker's number for the issue.
    pub number: IssueNumber,

    /// The issue's title as reported by this notification.
    pub title: String,

    /// When the tracker created the issue.
    pub created_at: DateTime<Utc>,

    /// Title of the issue's current milestone, absent when the issue has
    /// none (including the window between a remove/add milestone pair).
    pub milestone: Option<String>,

    /// Login of the user who triggered the notification.
    pub actor: String,

    /// What happened.
    pub action: IssueAction,

    /// Action-dependent context:
    /// - absent for plain opened/closed/reopened,
    /// - the prior title for a title edit,
    /// - the milestone title for milestoned/unmilestoned,
    /// - the label name for labeled/unlabeled.
    pub detail: Option<EventDetail>,

    /// The update timestamp the tracker reported.
    pub received_at: DateTime<Utc>,
}

impl IssueEvent {
    /// The label name carried in the detail, for labeled/unlabeled events.
    pub fn label_name(&self) -> Option<&str> {
        match &self.detail {
            Some(EventDetail::Label { label_name }) => Some(label_name),
            _ => None,
        }
    }
}

/// Action performed on a label itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelAction {
    /// Label was created.
    Created,
    /// Label was edited (possibly renamed).
    Edited,
    /// Label was deleted.
    Deleted,
}

impl LabelAction {
    /// Parses the tracker's action string. Unknown actions return `None`.
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "created" => Some(LabelAction::Created),
            "edited" => Some(LabelAction::Edited),
            "deleted" => Some(LabelAction::Deleted),
            _ => None,
        }
    }
}

/// A normalized label-category event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEvent {
    /// The action that triggered this event.
    pub action: LabelAction,

    /// The label's current name.
    pub name: String,

    /// The label's name before a rename. Only set when the notification's
    /// changes map carries a name change; color-only edits leave it empty.
    pub prior_name: Option<String>,
}

/// Action performed on a milestone itself.
///
/// The tracker also sends opened/closed milestone actions; those are
/// acknowledged without processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneAction {
    /// Milestone was created.
    Created,
    /// Milestone was edited (possibly renamed).
    Edited,
    /// Milestone was deleted.
    Deleted,
}

impl MilestoneAction {
    /// Parses the tracker's action string. Unknown actions return `None`.
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "created" => Some(MilestoneAction::Created),
            "edited" => Some(MilestoneAction::Edited),
            "deleted" => Some(MilestoneAction::Deleted),
            _ => None,
        }
    }
}

/// A normalized milestone-category event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneEvent {
    /// The action that triggered this event.
    pub action: MilestoneAction,

    /// The milestone's current title.
    pub title: String,

    /// The milestone's title before a rename. Only set when the
    /// notification's changes map carries a title change.
    pub prior_title: Option<String>,
}
