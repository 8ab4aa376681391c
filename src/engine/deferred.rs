//! Timed callbacks owned by a focus scope
//!
//! Each entry carries the token of the scope that was active when it was
//! scheduled. An entry whose scope has been destroyed is dropped unfired.

use crate::focus::graph::NodeKey;
use crate::focus::scope::ScopeToken;
use crate::router::PendingRelease;
use chrono::{DateTime, Local};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredAction {
    KeyRelease(PendingRelease),
    /// `attempt` counts earlier tries that found the graph not ready
    InitialFocus { node: NodeKey, attempt: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deferred {
    pub due_at: DateTime<Local>,
    pub owner: ScopeToken,
    pub action: DeferredAction,
}

/// Queue ordered by due time, insertion order for equal times
#[derive(Debug, Default)]
pub struct DeferredQueue {
    entries: Vec<Deferred>,
}

impl DeferredQueue {
    pub fn schedule(&mut self, entry: Deferred) {
        let index = self
            .entries
            .partition_point(|queued| queued.due_at <= entry.due_at);
        self.entries.insert(index, entry);
    }

    /// Removes and returns everything due at or before `now`
    pub fn take_due(&mut self, now: DateTime<Local>) -> Vec<Deferred> {
        let due = self.entries.partition_point(|queued| queued.due_at <= now);
        self.entries.drain(..due).collect()
    }

    /// Drops every entry owned by `owner`; returns how many were dropped
    pub fn cancel_owned_by(&mut self, owner: &ScopeToken) -> usize {
        let before = self.entries.len();
        self.entries.retain(|queued| &queued.owner != owner);
        before - self.entries.len()
    }

    pub fn next_deadline(&self) -> Option<DateTime<Local>> {
        self.entries.first().map(|entry| entry.due_at)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
