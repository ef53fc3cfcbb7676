//! Persistence gateway.
//!
//! The dispatcher never talks to a database directly; it drives the narrow
//! [`Gateway`]/[`Transaction`] interface defined here. That keeps the state
//! machine independent of storage technology and testable against the
//! in-memory implementation in [`memory`].
//!
//! # Transactional contract
//!
//! A [`Transaction`] collects entity mutations and event appends, and makes
//! them durable only on [`Transaction::commit`]. Implementations must
//! guarantee all-or-nothing visibility and must serialize transactions so
//! that two notifications for the same issue never interleave their writes.

pub mod memory;

pub use memory::MemoryGateway;

use thiserror::Error;

use crate::types::{EventId, Issue, IssueNumber, Label, Milestone, NewEvent};

/// Errors surfaced by the persistence gateway.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An insert or rename collided with an existing unique identity.
    #[error("{kind} {key:?} already exists")]
    Conflict { kind: &'static str, key: String },

    /// An update or delete targeted an identity that is not in the store.
    #[error("{kind} {key:?} not found")]
    NotFound { kind: &'static str, key: String },

    /// The backend itself failed (connection lost, commit refused, ...).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Handle to the persistent store; hands out transactions.
pub trait Gateway: Send + Sync {
    /// Opens a transaction. Returns when this transaction holds the write
    /// position; concurrent callers block until it commits or rolls back.
    fn begin(&self) -> Result<Box<dyn Transaction + '_>, StoreError>;
}

/// A single transactional scope over the store.
///
/// Mutations are invisible to other transactions until `commit`. Dropping a
/// transaction without committing discards it, same as `rollback`.
pub trait Transaction {
    // ─── Issues (identity: tracker-assigned number) ───

    fn issue_by_number(&mut self, number: IssueNumber) -> Result<Option<Issue>, StoreError>;
    fn insert_issue(&mut self, issue: &Issue) -> Result<(), StoreError>;
    fn update_issue(&mut self, issue: &Issue) -> Result<(), StoreError>;

    // ─── Labels (identity: unique name) ───

    fn label_by_name(&mut self, name: &str) -> Result<Option<Label>, StoreError>;
    fn insert_label(&mut self, label: &Label) -> Result<(), StoreError>;
    /// Replaces the label stored under `prior_name`, renaming it when the
    /// new value carries a different name.
    fn update_label(&mut self, prior_name: &str, label: &Label) -> Result<(), StoreError>;
    fn delete_label(&mut self, name: &str) -> Result<(), StoreError>;

    // ─── Milestones (identity: unique title) ───

    fn milestone_by_title(&mut self, title: &str) -> Result<Option<Milestone>, StoreError>;
    fn insert_milestone(&mut self, milestone: &Milestone) -> Result<(), StoreError>;
    /// Replaces the milestone stored under `prior_title`, renaming it when
    /// the new value carries a different title.
    fn update_milestone(&mut self, prior_title: &str, milestone: &Milestone)
    -> Result<(), StoreError>;
    fn delete_milestone(&mut self, title: &str) -> Result<(), StoreError>;

    // ─── Event log (append-only) ───

    /// Appends an event record and returns its store-assigned id.
    fn append_event(&mut self, event: NewEvent) -> Result<EventId, StoreError>;

    // ─── Lifecycle ───

    /// Makes every mutation in this transaction durable, atomically.
    fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Discards every mutation in this transaction.
    fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
