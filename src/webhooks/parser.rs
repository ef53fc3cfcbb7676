//! Webhook payload parser.
//!
//! This module normalizes raw tracker JSON payloads into the typed events of
//! [`super::events`]. The payload shape varies by action - label names arrive
//! at the top level, milestone titles inside the issue object, prior titles
//! inside a changes map - and this is where that variation ends.
//!
//! # Parsing Strategy
//!
//! 1. The category is determined from the event header (see
//!    [`super::classify`]) before any function here runs
//! 2. The payload is deserialized into `Raw*` structs with optional fields
//! 3. Required fields are validated explicitly per action
//! 4. Malformed payloads return `Err` with details; they never panic

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::types::{EventDetail, IssueNumber};

use super::events::{
    IssueAction, IssueEvent, LabelAction, LabelEvent, MilestoneAction, MilestoneEvent,
};

/// Error type for payload parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON deserialization failed (includes missing required fields).
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The action is not one this category processes.
    #[error("unsupported action: {0}")]
    UnsupportedAction(String),

    /// A field this action requires is absent.
    #[error("missing field: {0}")]
    MissingField(&'static str),
}

/// The `changes` map the tracker attaches to edit notifications.
///
/// Only the rename-relevant entries are modeled; color or description
/// changes deserialize to an empty map and do not constitute a rename.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Changes {
    /// Present when a title changed (issue edits, milestone renames).
    #[serde(default)]
    pub title: Option<ChangedFrom>,

    /// Present when a name changed (label renames).
    #[serde(default)]
    pub name: Option<ChangedFrom>,
}

/// A single entry in the changes map, carrying the prior value.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangedFrom {
    #[serde(default)]
    pub from: Option<String>,
}

// ============================================================================
// Raw payload structures for deserialization
//
// These match the tracker's webhook JSON structure. Fields the tracker may
// omit are Option<T>; required fields are validated explicitly per action.
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawIssuesPayload {
    action: String,
    issue: RawIssue,
    sender: RawSender,
    #[serde(default)]
    changes: Option<Changes>,
    /// The affected label, present for labeled/unlabeled notifications.
    #[serde(default)]
    label: Option<RawLabel>,
    /// The affected milestone. For unmilestoned notifications the issue's own
    /// milestone field is already null and this is the only place the removed
    /// milestone's title survives.
    #[serde(default)]
    milestone: Option<RawMilestone>,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    number: u64,
    title: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    milestone: Option<RawMilestone>,
}

#[derive(Debug, Deserialize)]
struct RawSender {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawMilestone {
    title: String,
}

#[derive(Debug, Deserialize)]
struct RawLabelPayload {
    action: String,
    label: RawLabel,
    #[serde(default)]
    changes: Option<Changes>,
}

#[derive(Debug, Deserialize)]
struct RawMilestonePayload {
    action: String,
    milestone: RawMilestone,
    #[serde(default)]
    changes: Option<Changes>,
}

/// Parses an issue-category payload into a normalized [`IssueEvent`].
///
/// The detail value is action-dependent:
/// - opened/closed/reopened: absent
/// - edited: the prior title from the changes map
/// - milestoned/unmilestoned: the affected milestone's title
/// - labeled/unlabeled: the affected label's name
///
/// # Errors
///
/// Returns [`ParseError`] when the body is not valid JSON, the action is not
/// a desirable one, or a field the action requires is absent.
pub fn parse_issue_event(payload: &[u8]) -> Result<IssueEvent, ParseError> {
    let raw: RawIssuesPayload = serde_json::from_slice(payload)?;

    let action =
        IssueAction::parse(&raw.action).ok_or_else(|| ParseError::UnsupportedAction(raw.action))?;

    // The issue's current milestone title, independent of the action.
    let milestone = raw.issue.milestone.as_ref().map(|m| m.title.clone());

    let detail = match action {
        IssueAction::Opened | IssueAction::Closed | IssueAction::Reopened => None,

        IssueAction::Edited => {
            let prior = raw
                .changes
                .and_then(|c| c.title)
                .and_then(|t| t.from)
                .ok_or(ParseError::MissingField("changes.title.from"))?;
            Some(EventDetail::PriorTitle { old_title: prior })
        }

        IssueAction::Milestoned | IssueAction::Unmilestoned => {
            // Prefer the issue's own milestone; fall back to the payload's
            // top-level milestone object, which is where the title lives once
            // the tracker has already detached it from the issue.
            let title = milestone
                .clone()
                .or(raw.milestone.map(|m| m.title))
                .ok_or(ParseError::MissingField("milestone"))?;
            Some(EventDetail::Milestone {
                milestone_title: title,
            })
        }

        IssueAction::Labeled | IssueAction::Unlabeled => {
            let label = raw.label.ok_or(ParseError::MissingField("label"))?;
            Some(EventDetail::Label {
                label_name: label.name,
            })
        }
    };

    Ok(IssueEvent {
        number: IssueNumber(raw.issue.number),
        title: raw.issue.title,
        created_at: raw.issue.created_at,
        milestone,
        actor: raw.sender.login,
        action,
        detail,
        received_at: raw.issue.updated_at,
    })
}

/// Parses a label-category payload into a normalized [`LabelEvent`].
///
/// The prior name is only set when the changes map carries a `name` entry;
/// the tracker also reports color changes through the same map and those must
/// not be mistaken for renames.
pub fn parse_label_event(payload: &[u8]) -> Result<LabelEvent, ParseError> {
    let raw: RawLabelPayload = serde_json::from_slice(payload)?;

    let action =
        LabelAction::parse(&raw.action).ok_or_else(|| ParseError::UnsupportedAction(raw.action))?;

    let prior_name = raw.changes.and_then(|c| c.name).and_then(|n| n.from);

    Ok(LabelEvent {
        action,
        name: raw.label.name,
        prior_name,
    })
}

/// Parses a milestone-category payload into a normalized [`MilestoneEvent`].
///
/// The prior title is only set when the changes map carries a `title` entry;
/// description and due-date edits travel through the same map and are not
/// renames.
pub fn parse_milestone_event(payload: &[u8]) -> Result<MilestoneEvent, ParseError> {
    let raw: RawMilestonePayload = serde_json::from_slice(payload)?;

    let action = MilestoneAction::parse(&raw.action)
        .ok_or_else(|| ParseError::UnsupportedAction(raw.action))?;

    let prior_title = raw.changes.and_then(|c| c.title).and_then(|t| t.from);

    Ok(MilestoneEvent {
        action,
        title: raw.milestone.title,
        prior_title,
    })
}
