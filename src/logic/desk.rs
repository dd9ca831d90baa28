//! Control desk: every live selection session, keyed by handle.

use crate::error::{ConsoleError, Result};
use crate::logic::adjustment::{apply_adjustment, AdjustmentReport};
use crate::models::{OperatorId, Partition, SelectionSession, SessionHandle};
use crate::store::Roster;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Per-session entry: selection data + owner + last activity time (for auto-cleanup).
struct SessionEntry {
    operator: OperatorId,
    session: SelectionSession,
    last_activity: Instant,
}

/// Live control sessions. Nothing touches the roster until `confirm_and_apply`.
#[derive(Default)]
pub struct ControlDesk {
    sessions: HashMap<SessionHandle, SessionEntry>,
}

impl ControlDesk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Snapshot the eligible players and open a new session for `operator`.
    pub fn start_session<R: Roster + ?Sized>(
        &mut self,
        roster: &R,
        operator: OperatorId,
    ) -> Result<SessionHandle> {
        let eligible = roster.list_eligible_player_names()?;
        let handle = Uuid::new_v4();
        log::info!(
            "Operator {} started control session {} over {} players",
            operator,
            handle,
            eligible.len()
        );
        self.sessions.insert(
            handle,
            SessionEntry {
                operator,
                session: SelectionSession::start(eligible),
                last_activity: Instant::now(),
            },
        );
        Ok(handle)
    }

    /// Read-only view of a session (does not refresh its activity time).
    pub fn session(&self, handle: SessionHandle) -> Result<&SelectionSession> {
        self.sessions
            .get(&handle)
            .map(|entry| &entry.session)
            .ok_or(ConsoleError::SessionNotFound(handle))
    }

    /// Operator who started the session, if it is still live.
    pub fn owner(&self, handle: SessionHandle) -> Option<OperatorId> {
        self.sessions.get(&handle).map(|entry| entry.operator)
    }

    fn touch(&mut self, handle: SessionHandle) -> Result<&mut SelectionSession> {
        let entry = self
            .sessions
            .get_mut(&handle)
            .ok_or(ConsoleError::SessionNotFound(handle))?;
        entry.last_activity = Instant::now();
        Ok(&mut entry.session)
    }

    pub fn submit_name(&mut self, handle: SessionHandle, name: &str) -> Result<()> {
        self.touch(handle)?.add_candidate(name)
    }

    /// Freeze the partition for review: the selection so far and everyone it leaves out.
    pub fn request_review(&mut self, handle: SessionHandle) -> Result<Partition> {
        self.touch(handle)?.begin_review()
    }

    pub fn remove_selected(&mut self, handle: SessionHandle, index: usize) -> Result<String> {
        self.touch(handle)?.remove_by_index(index)
    }

    /// Apply the reviewed partition and close the session.
    ///
    /// If the store refuses the update the session stays in review, so the operator
    /// can retry without typing the names again.
    pub fn confirm_and_apply<R: Roster + ?Sized>(
        &mut self,
        roster: &R,
        handle: SessionHandle,
    ) -> Result<AdjustmentReport> {
        let session = self.touch(handle)?;
        let partition = session.partition()?;
        let report = apply_adjustment(roster, &partition.selected, &partition.complement)?;
        session.finalize()?;
        self.sessions.remove(&handle);
        Ok(report)
    }

    pub fn cancel_session(&mut self, handle: SessionHandle) -> Result<()> {
        let mut entry = self
            .sessions
            .remove(&handle)
            .ok_or(ConsoleError::SessionNotFound(handle))?;
        entry.session.cancel()?;
        log::info!("Control session {} cancelled", handle);
        Ok(())
    }

    /// Drop sessions idle for `timeout` or longer as of `now`. Returns how many were removed.
    pub fn reap_idle(&mut self, now: Instant, timeout: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| now.saturating_duration_since(entry.last_activity) < timeout);
        before - self.sessions.len()
    }
}
