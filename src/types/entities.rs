//! Domain entities mirrored from the issue tracker.
//!
//! These are the persistent records the webhook stream is reconciled into:
//! issues, labels, milestones, and the append-only event log. The store owns
//! them; the dispatcher mutates them one transaction at a time.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{EventId, IssueNumber};
use crate::webhooks::events::IssueAction;

/// A tracked issue.
///
/// Created when the tracker reports an `opened` action and mutated in place by
/// later notifications. Issues are never deleted by this system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Tracker-assigned number; our identity for the issue.
    pub number: IssueNumber,

    /// Current title.
    pub title: String,

    /// When the tracker created the issue.
    pub created_at: DateTime<Utc>,

    /// Open/closed status. New issues start open.
    pub is_open: bool,

    /// Title of the associated milestone, if any.
    ///
    /// Milestone changes arrive as a remove-then-add pair of notifications, so
    /// an issue can sit briefly in a non-milestoned state between the two.
    /// That intermediate state is expected, not an error.
    pub milestone: Option<String>,

    /// Names of the labels currently applied to the issue.
    pub labels: BTreeSet<String>,
}

impl Issue {
    /// Creates a newly opened issue with no labels.
    pub fn opened(
        number: IssueNumber,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
        milestone: Option<String>,
    ) -> Self {
        Issue {
            number,
            title: title.into(),
            created_at,
            is_open: true,
            milestone,
            labels: BTreeSet::new(),
        }
    }
}

/// A label, identified by its (unique) name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Label { name: name.into() }
    }
}

/// A milestone, identified by its (unique) title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub title: String,
}

impl Milestone {
    pub fn new(title: impl Into<String>) -> Self {
        Milestone {
            title: title.into(),
        }
    }
}

/// Action-dependent context stored alongside an event log record.
///
/// The variants serialize to the historical wire shapes, e.g.
/// `{"old title": "..."}`, `{"milestone title": "..."}`,
/// `{"label name": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventDetail {
    /// The title an edit replaced.
    PriorTitle {
        #[serde(rename = "old title")]
        old_title: String,
    },

    /// The milestone a milestoned/unmilestoned notification named.
    Milestone {
        #[serde(rename = "milestone title")]
        milestone_title: String,
    },

    /// The label a labeled/unlabeled notification named.
    Label {
        #[serde(rename = "label name")]
        label_name: String,
    },
}

/// An event log record, not yet inserted.
///
/// The store assigns the [`EventId`] on insertion; see
/// [`EventRecord`] for the persisted form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    /// The issue the event belongs to.
    pub issue: IssueNumber,

    /// Login of the user who triggered the notification.
    pub actor: String,

    /// What happened.
    pub action: IssueAction,

    /// Action-dependent context, absent for plain open/close/reopen.
    pub detail: Option<EventDetail>,

    /// The update timestamp the tracker reported for the notification.
    pub received_at: DateTime<Utc>,
}

/// A persisted event log record.
///
/// Records are append-only: never updated, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Store-assigned identity.
    pub id: EventId,

    pub issue: IssueNumber,
    pub actor: String,
    pub action: IssueAction,
    pub detail: Option<EventDetail>,
    pub received_at: DateTime<Utc>,
}

impl EventRecord {
    /// Materializes a record from a [`NewEvent`] and a store-assigned id.
    pub fn from_new(id: EventId, event: NewEvent) -> Self {
        EventRecord {
            id,
            issue: event.issue,
            actor: event.actor,
            action: event.action,
            detail: event.detail,
            received_at: event.received_at,
        }
    }
}
