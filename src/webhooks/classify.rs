//! Notification classification.
//!
//! Two decisions are made here, both before any payload normalization:
//!
//! 1. Which category a notification belongs to, from its event header:
//!    issues, label, milestone, the tracker's liveness ping, or unknown.
//! 2. For issue-category notifications, whether the action is *desirable* -
//!    worth persisting at all. Assignment changes and body-only edits are
//!    acknowledged but never stored.

use tracing::info;

use super::parser::Changes;

/// The notification's top-level category, from the event header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    /// An issue changed: lifecycle, title, milestone, or labels.
    Issues,
    /// A label itself was created, renamed, or deleted.
    Label,
    /// A milestone itself was created, renamed, or deleted.
    Milestone,
    /// The tracker's liveness check.
    Ping,
    /// Anything else the tracker may send now or in the future.
    Unknown,
}

impl EventCategory {
    /// Classifies the event header value.
    pub fn from_header(value: &str) -> Self {
        match value {
            "issues" => EventCategory::Issues,
            "label" => EventCategory::Label,
            "milestone" => EventCategory::Milestone,
            "ping" => EventCategory::Ping,
            _ => EventCategory::Unknown,
        }
    }
}

/// Decides whether an issue-category action is worth persisting.
///
/// Desirable actions are the lifecycle, milestone, and label changes, plus
/// edits that touched the title. We only store titles, so a body-only edit is
/// not desirable. Assignment changes are expected traffic we deliberately
/// skip; any action outside the known set is logged so a new tracker action
/// surfaces in the operational log rather than vanishing.
pub fn is_desirable_issue_event(action: &str, changes: Option<&Changes>) -> bool {
    match action {
        "opened" | "closed" | "reopened" | "labeled" | "unlabeled" | "milestoned"
        | "unmilestoned" => true,
        "edited" => changes.is_some_and(|c| c.title.is_some()),
        "assigned" | "unassigned" => false,
        other => {
            info!(action = other, "tracker sent an unrecognized issues action");
            false
        }
    }
}
