//! Attendance control dialogue on top of the control desk.

use super::{Console, Dialogue, Keyboard, Reply};
use crate::error::ConsoleError;
use crate::models::{OperatorId, Partition, SelectionState, SessionHandle};
use crate::store::{Catalog, Roster};

pub const REVIEW: &str = "control-review";
pub const APPLY: &str = "control-apply";
pub const CANCEL: &str = "control-cancel";

fn collecting(text: impl Into<String>) -> Reply {
    Reply::text(text)
        .button("Finish", REVIEW)
        .button("Cancel all", CANCEL)
}

fn reviewing(text: impl Into<String>) -> Reply {
    Reply::text(text)
        .button("Apply", APPLY)
        .button("Cancel all", CANCEL)
}

fn review_text(partition: &Partition) -> String {
    let mut text = if partition.selected.is_empty() {
        "No players marked present.\n".to_string()
    } else {
        let lines: Vec<String> = partition
            .selected
            .iter()
            .enumerate()
            .map(|(idx, name)| format!("[{idx}] {name}"))
            .collect();
        format!("Present players:\n\n{}\n", lines.join("\n"))
    };
    text.push_str(&format!(
        "\nEveryone else ({}) gets +1.\nTo drop a player from the list send their number.",
        partition.complement.len()
    ));
    text
}

impl<S: Roster + Catalog> Console<S> {
    /// Open a fresh control session, dropping any the operator left open.
    pub(super) fn start_control(&mut self, operator: OperatorId) -> Reply {
        self.reset_dialogue(operator);
        match self.desk.start_session(self.store.as_ref(), operator) {
            Ok(handle) => {
                self.set_dialogue(operator, Dialogue::Control(handle));
                collecting("Enter the callsign of a present player").keyboard(Keyboard::Remove)
            }
            Err(e) => {
                log::warn!("Could not start control for operator {}: {}", operator, e);
                Reply::text(format!("Could not load the roster: {e}"))
            }
        }
    }

    pub(super) fn control_text(
        &mut self,
        operator: OperatorId,
        handle: SessionHandle,
        text: &str,
    ) -> Reply {
        let reviewing_now = match self.desk.session(handle) {
            Ok(session) => matches!(session.state(), SelectionState::Reviewing { .. }),
            Err(e) => return self.control_error(operator, e),
        };
        if !reviewing_now {
            return match self.desk.submit_name(handle, text) {
                Ok(()) => collecting("Player added. Enter another or press a button."),
                Err(ConsoleError::NotEligible(_)) => Reply::text(
                    "No such active player. They may be on leave or need removing.",
                ),
                Err(e) => self.control_error(operator, e),
            };
        }
        let Ok(index) = text.parse::<usize>() else {
            return Reply::text("Send the number of the player to remove.");
        };
        match self.desk.remove_selected(handle, index) {
            Ok(name) => collecting(format!(
                "Player {name} removed. Enter another or press a button."
            )),
            Err(ConsoleError::IndexOutOfRange { .. }) => Reply::text("Invalid player number."),
            Err(e) => self.control_error(operator, e),
        }
    }

    pub(super) fn control_action(&mut self, operator: OperatorId, data: &str) -> Option<Reply> {
        if ![REVIEW, APPLY, CANCEL].contains(&data) {
            return None;
        }
        let Dialogue::Control(handle) = self.dialogue(operator) else {
            return Some(Reply::text("No control in progress. Press Control to start."));
        };
        let reply = match data {
            REVIEW => match self.desk.request_review(handle) {
                Ok(partition) => reviewing(review_text(&partition)),
                Err(e) => self.control_error(operator, e),
            },
            APPLY => match self.desk.confirm_and_apply(self.store.as_ref(), handle) {
                Ok(report) => {
                    self.set_dialogue(operator, Dialogue::Idle);
                    Reply::text(format!(
                        "Data updated: {} present, {} absent.",
                        report.decremented, report.incremented
                    ))
                    .keyboard(Keyboard::AdminMenu)
                }
                Err(e) if e.is_retryable() => reviewing(
                    "Could not save the results, nothing was changed. Press Apply to try again.",
                ),
                Err(e) => self.control_error(operator, e),
            },
            _ => {
                self.reset_dialogue(operator);
                Reply::text("Actions cancelled").keyboard(Keyboard::AdminMenu)
            }
        };
        Some(reply)
    }

    fn control_error(&mut self, operator: OperatorId, e: ConsoleError) -> Reply {
        match e {
            ConsoleError::SessionNotFound(_) => {
                self.set_dialogue(operator, Dialogue::Idle);
                Reply::text("The control session has expired. Press Control to start again.")
                    .keyboard(Keyboard::AdminMenu)
            }
            ConsoleError::InvalidSessionState { .. } => {
                log::debug!("Operator {}: {}", operator, e);
                Reply::text("That action is not available right now.")
            }
            other => {
                log::warn!("Control error for operator {}: {}", operator, other);
                Reply::text(format!("Something went wrong: {other}"))
            }
        }
    }
}
