//! Core domain types: identifiers and persistent entities.

mod entities;
mod ids;

pub use entities::{EventDetail, EventRecord, Issue, Label, Milestone, NewEvent};
pub use ids::{EventId, IssueNumber};
