//! Errors raised by the console, the control desk and the store.

use crate::models::SessionHandle;
use thiserror::Error;

/// Errors that can occur during console operations.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Name is not on the roster snapshot taken when the session started.
    #[error("'{0}' is not an active player (may be on leave or removed)")]
    NotEligible(String),
    /// Removal index does not point into the current selection.
    #[error("No selected player at position {index} (selection has {len})")]
    IndexOutOfRange { index: usize, len: usize },
    /// Session operation invoked in a state that does not allow it.
    #[error("Cannot {op} while the session is {state}")]
    InvalidSessionState {
        op: &'static str,
        state: &'static str,
    },
    /// No live control session under this handle (finished, cancelled or reaped).
    #[error("Control session {0} not found")]
    SessionNotFound(SessionHandle),
    /// Names must be 3..=150 characters after trimming.
    #[error("Name must be between 3 and 150 characters")]
    InvalidName,
    /// A card or player with this name already exists.
    #[error("'{0}' already exists")]
    Duplicate(String),
    /// No card or player with this name.
    #[error("'{0}' not found")]
    NotFound(String),
    /// The database rejected the operation; nothing was committed.
    #[error("Storage failure: {0}")]
    Persistence(#[from] rusqlite::Error),
    #[error("Storage lock poisoned")]
    LockPoisoned,
    #[error("Report export failed: {0}")]
    Export(#[from] csv::Error),
}

impl ConsoleError {
    /// Whether the operator may simply try the same action again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ConsoleError::Persistence(_) | ConsoleError::LockPoisoned)
    }
}

pub type Result<T, E = ConsoleError> = std::result::Result<T, E>;
