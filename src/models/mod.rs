//! Data structures for the roster console: cards, players, selection sessions.

mod card;
mod player;
mod selection;

pub use card::{Card, CardDraft};
pub use player::{
    validate_name, Direction, Player, PlayerStatus, ESCALATION_THRESHOLD, MAX_NAME_LEN,
    MIN_NAME_LEN,
};
pub use selection::{OperatorId, Partition, SelectionSession, SelectionState, SessionHandle};
