//! In-memory persistence gateway.
//!
//! Backs the test suite and the default binary. Transactions take a copy of
//! the tables on begin and swap it back on commit, so rollback is a drop and
//! commit is atomic. The begin call acquires the table lock for the life of
//! the transaction, which serializes writers: notifications for the same
//! issue cannot interleave.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::types::{EventId, EventRecord, Issue, IssueNumber, Label, Milestone, NewEvent};

use super::{Gateway, StoreError, Transaction};

#[derive(Debug, Clone, Default)]
struct Tables {
    issues: BTreeMap<IssueNumber, Issue>,
    labels: BTreeMap<String, Label>,
    milestones: BTreeMap<String, Milestone>,
    events: Vec<EventRecord>,
    next_event_id: u64,
}

/// An in-memory [`Gateway`].
#[derive(Debug)]
pub struct MemoryGateway {
    tables: Mutex<Tables>,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        MemoryGateway {
            tables: Mutex::new(Tables {
                next_event_id: 1,
                ..Tables::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // A poisoned lock only means another writer panicked mid-transaction;
        // its working copy never reached the shared tables, so the data is
        // intact and safe to hand out.
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads an issue outside any transaction.
    pub fn issue(&self, number: IssueNumber) -> Option<Issue> {
        self.lock().issues.get(&number).cloned()
    }

    /// Reads a label outside any transaction.
    pub fn label(&self, name: &str) -> Option<Label> {
        self.lock().labels.get(name).cloned()
    }

    /// Reads a milestone outside any transaction.
    pub fn milestone(&self, title: &str) -> Option<Milestone> {
        self.lock().milestones.get(title).cloned()
    }

    /// Snapshot of the event log, oldest first.
    pub fn events(&self) -> Vec<EventRecord> {
        self.lock().events.clone()
    }

    /// Number of labels currently stored.
    pub fn label_count(&self) -> usize {
        self.lock().labels.len()
    }

    /// Number of milestones currently stored.
    pub fn milestone_count(&self) -> usize {
        self.lock().milestones.len()
    }
}

impl Gateway for MemoryGateway {
    fn begin(&self) -> Result<Box<dyn Transaction + '_>, StoreError> {
        let guard = self.lock();
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }
}

struct MemoryTransaction<'a> {
    /// Held for the whole transaction: single writer at a time.
    guard: MutexGuard<'a, Tables>,
    /// Mutations land here and become visible on commit.
    working: Tables,
}

impl Transaction for MemoryTransaction<'_> {
    fn issue_by_number(&mut self, number: IssueNumber) -> Result<Option<Issue>, StoreError> {
        Ok(self.working.issues.get(&number).cloned())
    }

    fn insert_issue(&mut self, issue: &Issue) -> Result<(), StoreError> {
        if self.working.issues.contains_key(&issue.number) {
            return Err(StoreError::Conflict {
                kind: "issue",
                key: issue.number.to_string(),
            });
        }
        self.working.issues.insert(issue.number, issue.clone());
        Ok(())
    }

    fn update_issue(&mut self, issue: &Issue) -> Result<(), StoreError> {
        match self.working.issues.get_mut(&issue.number) {
            Some(slot) => {
                *slot = issue.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound {
                kind: "issue",
                key: issue.number.to_string(),
            }),
        }
    }

    fn label_by_name(&mut self, name: &str) -> Result<Option<Label>, StoreError> {
        Ok(self.working.labels.get(name).cloned())
    }

    fn insert_label(&mut self, label: &Label) -> Result<(), StoreError> {
        if self.working.labels.contains_key(&label.name) {
            return Err(StoreError::Conflict {
                kind: "label",
                key: label.name.clone(),
            });
        }
        self.working.labels.insert(label.name.clone(), label.clone());
        Ok(())
    }

    fn update_label(&mut self, prior_name: &str, label: &Label) -> Result<(), StoreError> {
        if self.working.labels.remove(prior_name).is_none() {
            return Err(StoreError::NotFound {
                kind: "label",
                key: prior_name.to_string(),
            });
        }
        if self.working.labels.contains_key(&label.name) {
            return Err(StoreError::Conflict {
                kind: "label",
                key: label.name.clone(),
            });
        }
        self.working.labels.insert(label.name.clone(), label.clone());
        Ok(())
    }

    fn delete_label(&mut self, name: &str) -> Result<(), StoreError> {
        match self.working.labels.remove(name) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound {
                kind: "label",
                key: name.to_string(),
            }),
        }
    }

    fn milestone_by_title(&mut self, title: &str) -> Result<Option<Milestone>, StoreError> {
        Ok(self.working.milestones.get(title).cloned())
    }

    fn insert_milestone(&mut self, milestone: &Milestone) -> Result<(), StoreError> {
        if self.working.milestones.contains_key(&milestone.title) {
            return Err(StoreError::Conflict {
                kind: "milestone",
                key: milestone.title.clone(),
            });
        }
        self.working
            .milestones
            .insert(milestone.title.clone(), milestone.clone());
        Ok(())
    }

    fn update_milestone(
        &mut self,
        prior_title: &str,
        milestone: &Milestone,
    ) -> Result<(), StoreError> {
        if self.working.milestones.remove(prior_title).is_none() {
            return Err(StoreError::NotFound {
                kind: "milestone",
                key: prior_title.to_string(),
            });
        }
        if self.working.milestones.contains_key(&milestone.title) {
            return Err(StoreError::Conflict {
                kind: "milestone",
                key: milestone.title.clone(),
            });
        }
        self.working
            .milestones
            .insert(milestone.title.clone(), milestone.clone());
        Ok(())
    }

    fn delete_milestone(&mut self, title: &str) -> Result<(), StoreError> {
        match self.working.milestones.remove(title) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound {
                kind: "milestone",
                key: title.to_string(),
            }),
        }
    }

    fn append_event(&mut self, event: NewEvent) -> Result<EventId, StoreError> {
        let id = EventId(self.working.next_event_id);
        self.working.next_event_id += 1;
        self.working.events.push(EventRecord::from_new(id, event));
        Ok(id)
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        // Dropping the working copy is the rollback.
        Ok(())
    }
}
