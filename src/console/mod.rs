//! Chat console: turns operator events into replies.
//!
//! The bot framework posts one [`Event`] per message or button press and renders the
//! [`Reply`] it gets back. Multi-step flows keep their context in a per-operator
//! [`Dialogue`] value instead of framework state strings, so two admins editing at the
//! same time never see each other's drafts.

mod admin;
mod control;
mod public;

use crate::logic::ControlDesk;
use crate::models::{Card, OperatorId, SessionHandle};
use crate::store::{Catalog, Roster};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Reply-keyboard labels of the admin main menu.
pub const ADMIN_MENU: [&str; 4] = ["Cards", "Players", "Reports", "Control"];

/// Where the message came from. Only private chats are served.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    #[default]
    Private,
    Group,
    Supergroup,
    Channel,
}

/// One operator input.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Typed message.
    Text { text: String },
    /// Uploaded picture; `file_id` is the platform's handle for the largest size.
    Photo { file_id: String },
    /// Inline button press carrying its callback data.
    Action { data: String },
}

impl Event {
    pub fn text(text: impl Into<String>) -> Self {
        Event::Text { text: text.into() }
    }

    pub fn photo(file_id: impl Into<String>) -> Self {
        Event::Photo {
            file_id: file_id.into(),
        }
    }

    pub fn action(data: impl Into<String>) -> Self {
        Event::Action { data: data.into() }
    }
}

/// Inline button under a reply.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub data: String,
}

/// What to do with the persistent reply keyboard.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Keyboard {
    #[default]
    Unchanged,
    /// Show [`ADMIN_MENU`].
    AdminMenu,
    Remove,
}

/// Message to send back to the operator.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
    #[serde(default)]
    pub keyboard: Keyboard,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn button(mut self, label: impl Into<String>, data: impl Into<String>) -> Self {
        self.buttons.push(Button {
            label: label.into(),
            data: data.into(),
        });
        self
    }

    pub fn keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = keyboard;
        self
    }

    pub fn photo(mut self, file_id: impl Into<String>) -> Self {
        self.photo = Some(file_id.into());
        self
    }
}

/// Where an operator is inside a multi-step flow.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Dialogue {
    #[default]
    Idle,
    /// Waiting for a card name; `editing` holds the card being changed, if any.
    CardName { editing: Option<Card> },
    /// Name accepted, waiting for the picture.
    CardImage { name: String, editing: Option<Card> },
    /// Waiting for a callsign; `editing` holds the current name when renaming.
    PlayerName { editing: Option<String> },
    /// Attendance control in progress.
    Control(SessionHandle),
}

struct DialogueEntry {
    dialogue: Dialogue,
    last_activity: Instant,
}

/// Admin console over a roster/catalog store.
pub struct Console<S> {
    store: Arc<S>,
    desk: ControlDesk,
    dialogues: HashMap<OperatorId, DialogueEntry>,
    admins: HashSet<OperatorId>,
}

impl<S: Roster + Catalog> Console<S> {
    pub fn new(store: Arc<S>, admins: HashSet<OperatorId>) -> Self {
        Self {
            store,
            desk: ControlDesk::new(),
            dialogues: HashMap::new(),
            admins,
        }
    }

    pub fn is_admin(&self, operator: OperatorId) -> bool {
        self.admins.contains(&operator)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn desk(&self) -> &ControlDesk {
        &self.desk
    }

    /// The desk together with the store, for callers driving control sessions directly.
    pub fn desk_and_store(&mut self) -> (&mut ControlDesk, &S) {
        (&mut self.desk, self.store.as_ref())
    }

    /// Current flow of `operator` (Idle when none).
    pub fn dialogue(&self, operator: OperatorId) -> Dialogue {
        self.dialogues
            .get(&operator)
            .map(|entry| entry.dialogue.clone())
            .unwrap_or_default()
    }

    fn set_dialogue(&mut self, operator: OperatorId, dialogue: Dialogue) {
        if dialogue == Dialogue::Idle {
            self.dialogues.remove(&operator);
            return;
        }
        self.dialogues.insert(
            operator,
            DialogueEntry {
                dialogue,
                last_activity: Instant::now(),
            },
        );
    }

    /// Leave the current flow, cancelling an open control session.
    fn reset_dialogue(&mut self, operator: OperatorId) {
        if let Some(entry) = self.dialogues.remove(&operator) {
            if let Dialogue::Control(handle) = entry.dialogue {
                // Already reaped sessions are fine to ignore here.
                let _ = self.desk.cancel_session(handle);
            }
        }
    }

    /// Handle one event. `None` means the event is not for this console and gets no answer.
    pub fn handle(&mut self, operator: OperatorId, chat: ChatKind, event: Event) -> Option<Reply> {
        if chat != ChatKind::Private {
            return None;
        }
        log::debug!("Operator {} sent {:?}", operator, event);
        if !self.is_admin(operator) {
            return self.public_event(&event);
        }
        if let Some(entry) = self.dialogues.get_mut(&operator) {
            entry.last_activity = Instant::now();
        }
        self.admin_event(operator, &event)
            .or_else(|| self.public_event(&event))
    }

    /// Drop dialogues and control sessions idle for `timeout` or longer. Returns the total removed.
    pub fn reap_idle(&mut self, now: Instant, timeout: Duration) -> usize {
        let before = self.dialogues.len();
        self.dialogues
            .retain(|_, entry| now.saturating_duration_since(entry.last_activity) < timeout);
        let dialogues = before - self.dialogues.len();
        let sessions = self.desk.reap_idle(now, timeout);
        if dialogues + sessions > 0 {
            log::info!(
                "Reaped {} idle dialogue(s) and {} idle control session(s)",
                dialogues,
                sessions
            );
        }
        dialogues + sessions
    }
}
