//! Roster console: admin chat-bot backend for a card catalog, a player roster and
//! attendance control rounds.

pub mod config;
pub mod console;
pub mod error;
pub mod logic;
pub mod models;
pub mod store;
pub mod web;

pub use config::Config;
pub use console::{Button, ChatKind, Console, Dialogue, Event, Keyboard, Reply};
pub use error::{ConsoleError, Result};
pub use logic::{apply_adjustment, status_report, AdjustmentReport, ControlDesk, StatusReport};
pub use models::{
    validate_name, Card, CardDraft, Direction, OperatorId, Partition, Player, PlayerStatus,
    SelectionSession, SelectionState, SessionHandle, ESCALATION_THRESHOLD,
};
pub use store::{Catalog, Roster, SqliteStore};
