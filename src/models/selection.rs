//! Selection session: the operator's in-progress list of present players.

use crate::error::{ConsoleError, Result};
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

/// Unique identifier for a control session.
pub type SessionHandle = Uuid;

/// Chat user id of the operator driving a session.
pub type OperatorId = i64;

/// The two disjoint name sets handed to the adjustment engine.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Partition {
    /// Players marked present; decremented.
    pub selected: Vec<String>,
    /// Everyone else on the snapshot; incremented.
    pub complement: Vec<String>,
}

/// Current phase of a selection session.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SelectionState {
    /// Operator is typing names.
    CollectingNames,
    /// Operator is looking at the list; complement frozen at review time.
    Reviewing { complement: Vec<String> },
    /// Partition handed out; session is done.
    Finalized,
    /// Operator gave up; nothing was applied.
    Cancelled,
}

impl SelectionState {
    pub fn name(&self) -> &'static str {
        match self {
            SelectionState::CollectingNames => "collecting names",
            SelectionState::Reviewing { .. } => "reviewing",
            SelectionState::Finalized => "finalized",
            SelectionState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SelectionState::Finalized | SelectionState::Cancelled)
    }
}

/// Per-operator selection over an immutable snapshot of eligible player names.
#[derive(Clone, Debug)]
pub struct SelectionSession {
    snapshot: Vec<String>,
    eligible: HashSet<String>,
    selected: Vec<String>,
    state: SelectionState,
}

impl SelectionSession {
    /// Capture the snapshot and start collecting. Repeated names keep their first position.
    pub fn start<I, S>(eligible_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut eligible = HashSet::new();
        let snapshot = eligible_names
            .into_iter()
            .map(Into::into)
            .filter(|name: &String| eligible.insert(name.clone()))
            .collect();
        Self {
            snapshot,
            eligible,
            selected: Vec::new(),
            state: SelectionState::CollectingNames,
        }
    }

    pub fn snapshot(&self) -> &[String] {
        &self.snapshot
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    fn invalid(&self, op: &'static str) -> ConsoleError {
        ConsoleError::InvalidSessionState {
            op,
            state: self.state.name(),
        }
    }

    /// Mark `name` present. Re-adding a name already selected is a no-op.
    pub fn add_candidate(&mut self, name: &str) -> Result<()> {
        if self.state != SelectionState::CollectingNames {
            return Err(self.invalid("add a player"));
        }
        let name = name.trim();
        if !self.eligible.contains(name) {
            return Err(ConsoleError::NotEligible(name.to_string()));
        }
        if !self.selected.iter().any(|s| s == name) {
            self.selected.push(name.to_string());
        }
        Ok(())
    }

    /// Freeze `snapshot - selected` and switch to review. Returns the frozen partition.
    pub fn begin_review(&mut self) -> Result<Partition> {
        if self.state != SelectionState::CollectingNames {
            return Err(self.invalid("review the selection"));
        }
        let chosen: HashSet<&str> = self.selected.iter().map(String::as_str).collect();
        let complement: Vec<String> = self
            .snapshot
            .iter()
            .filter(|name| !chosen.contains(name.as_str()))
            .cloned()
            .collect();
        self.state = SelectionState::Reviewing { complement };
        self.partition()
    }

    /// Drop the selected entry at `index` (0-based) and go back to collecting names.
    ///
    /// The complement frozen by the review is discarded with the review state; it is
    /// computed again by the next [`begin_review`](Self::begin_review), so a removed
    /// name rejoins the increment set only once the operator reviews again.
    pub fn remove_by_index(&mut self, index: usize) -> Result<String> {
        if !matches!(self.state, SelectionState::Reviewing { .. }) {
            return Err(self.invalid("remove a player"));
        }
        if index >= self.selected.len() {
            return Err(ConsoleError::IndexOutOfRange {
                index,
                len: self.selected.len(),
            });
        }
        let removed = self.selected.remove(index);
        self.state = SelectionState::CollectingNames;
        Ok(removed)
    }

    /// The frozen partition, without leaving review.
    pub fn partition(&self) -> Result<Partition> {
        match &self.state {
            SelectionState::Reviewing { complement } => Ok(Partition {
                selected: self.selected.clone(),
                complement: complement.clone(),
            }),
            _ => Err(self.invalid("read the partition")),
        }
    }

    /// Hand out the partition and finish the session.
    pub fn finalize(&mut self) -> Result<Partition> {
        match std::mem::replace(&mut self.state, SelectionState::Finalized) {
            SelectionState::Reviewing { complement } => Ok(Partition {
                selected: std::mem::take(&mut self.selected),
                complement,
            }),
            other => {
                self.state = other;
                Err(self.invalid("finalize"))
            }
        }
    }

    /// Abandon the session and drop everything collected so far.
    pub fn cancel(&mut self) -> Result<()> {
        if self.state.is_terminal() {
            return Err(self.invalid("cancel"));
        }
        self.selected.clear();
        self.snapshot.clear();
        self.eligible.clear();
        self.state = SelectionState::Cancelled;
        Ok(())
    }
}
