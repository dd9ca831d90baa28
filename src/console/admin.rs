//! Admin menu: cards, players and reports.

use super::{Console, Dialogue, Event, Keyboard, Reply};
use crate::error::{ConsoleError, Result};
use crate::logic::status_report;
use crate::models::{validate_name, Card, CardDraft, OperatorId, PlayerStatus};
use crate::store::{Catalog, Roster};

/// Message prefix to open a card in the admin view: `card_<name>`.
pub const CARD_PREFIX: &str = "card_";
/// Message prefix to open a player: `player_<callsign>`.
pub const PLAYER_PREFIX: &str = "player_";
/// Sent instead of a value to keep the current one while editing.
pub const KEEP: &str = ".";

const CANNOT_SKIP: &str = "This step cannot be skipped when creating a new item.";
const SEND_IMAGE: &str = "Send the card image.";

fn cards_menu() -> Reply {
    Reply::text(format!(
        "To view a card in detail send {CARD_PREFIX}<card name>"
    ))
    .button("New card", "add-new-card")
    .button("Card list", "card-list")
}

fn players_menu() -> Reply {
    Reply::text(format!(
        "To view a player in detail send {PLAYER_PREFIX}<callsign>"
    ))
    .button("New player", "add-new-player")
    .button("Player list", "players-list")
}

fn reports_menu() -> Reply {
    PlayerStatus::ALL
        .into_iter()
        .fold(Reply::text("Choose a report"), |reply, status| {
            reply.button(status.label(), format!("report_{}", status.as_str()))
        })
}

fn saved_reply(result: Result<()>) -> Reply {
    match result {
        Ok(()) => Reply::text("Saved.").keyboard(Keyboard::AdminMenu),
        Err(ConsoleError::Duplicate(_)) => {
            Reply::text("An item with this name already exists.").keyboard(Keyboard::AdminMenu)
        }
        Err(e) => {
            log::warn!("Save failed: {}", e);
            Reply::text(format!("Could not save: {e}")).keyboard(Keyboard::AdminMenu)
        }
    }
}

fn lookup_failed(what: &str, e: ConsoleError) -> Reply {
    log::warn!("{} lookup failed: {}", what, e);
    Reply::text(format!("Could not load {what}: {e}"))
}

impl<S: Roster + Catalog> Console<S> {
    pub(super) fn admin_event(&mut self, operator: OperatorId, event: &Event) -> Option<Reply> {
        match event {
            Event::Text { text } => self.admin_text(operator, text.trim()),
            Event::Photo { file_id } => match self.dialogue(operator) {
                Dialogue::CardImage { name, editing } => {
                    Some(self.save_card(operator, name, file_id.clone(), editing))
                }
                _ => None,
            },
            Event::Action { data } => self.admin_action(operator, data),
        }
    }

    fn admin_text(&mut self, operator: OperatorId, text: &str) -> Option<Reply> {
        // During a control round every message is a callsign or an index; the round is
        // left through its inline buttons.
        if let Dialogue::Control(handle) = self.dialogue(operator) {
            return Some(self.control_text(operator, handle, text));
        }
        match text.to_lowercase().as_str() {
            "cancel" | "/cancel" => return self.cancel_dialogue(operator),
            "back" | "/back" => return self.step_back(operator),
            _ => {}
        }
        match text {
            "/admin" => {
                return Some(Reply::text("What would you like to do?").keyboard(Keyboard::AdminMenu))
            }
            "/off" => return Some(Reply::text("Admin keyboard removed").keyboard(Keyboard::Remove)),
            "Cards" => return Some(cards_menu()),
            "Players" => return Some(players_menu()),
            "Reports" => return Some(reports_menu()),
            "Control" => return Some(self.start_control(operator)),
            _ => {}
        }
        if let Some(name) = text.strip_prefix(CARD_PREFIX) {
            return Some(self.show_card(name.trim()));
        }
        if let Some(name) = text.strip_prefix(PLAYER_PREFIX) {
            return Some(self.show_player(name.trim()));
        }
        match self.dialogue(operator) {
            Dialogue::Idle => None,
            Dialogue::CardName { editing } => Some(self.card_name_input(operator, text, editing)),
            Dialogue::CardImage { name, editing } => {
                if text != KEEP {
                    return Some(Reply::text(SEND_IMAGE));
                }
                match editing.as_ref().and_then(|card| card.image.clone()) {
                    Some(image) => Some(self.save_card(operator, name, image, editing)),
                    None => Some(Reply::text(CANNOT_SKIP)),
                }
            }
            Dialogue::PlayerName { editing } => {
                Some(self.player_name_input(operator, text, editing))
            }
            Dialogue::Control(_) => None,
        }
    }

    fn admin_action(&mut self, operator: OperatorId, data: &str) -> Option<Reply> {
        let reply = match data {
            "add-new-card" => {
                self.reset_dialogue(operator);
                self.set_dialogue(operator, Dialogue::CardName { editing: None });
                Reply::text("Enter the card name").keyboard(Keyboard::Remove)
            }
            "card-list" => self.card_list(),
            "add-new-player" => {
                self.reset_dialogue(operator);
                self.set_dialogue(operator, Dialogue::PlayerName { editing: None });
                Reply::text("Enter the callsign").keyboard(Keyboard::Remove)
            }
            "players-list" => self.player_list(),
            _ => {
                if let Some(name) = data.strip_prefix("change-card_") {
                    self.begin_card_edit(operator, name)
                } else if let Some(name) = data.strip_prefix("delete-card_") {
                    self.delete_card(name)
                } else if let Some(name) = data.strip_prefix("change-player_") {
                    self.begin_player_rename(operator, name)
                } else if let Some(name) = data.strip_prefix("change-status_") {
                    self.toggle_player_status(name)
                } else if let Some(name) = data.strip_prefix("delete-player_") {
                    self.delete_player(name)
                } else if let Some(status) = data.strip_prefix("report_") {
                    self.report(status)
                } else {
                    return self.control_action(operator, data);
                }
            }
        };
        Some(reply)
    }

    fn cancel_dialogue(&mut self, operator: OperatorId) -> Option<Reply> {
        if self.dialogue(operator) == Dialogue::Idle {
            return None;
        }
        self.reset_dialogue(operator);
        Some(Reply::text("Action cancelled").keyboard(Keyboard::AdminMenu))
    }

    fn step_back(&mut self, operator: OperatorId) -> Option<Reply> {
        match self.dialogue(operator) {
            Dialogue::CardImage { editing, .. } => {
                self.set_dialogue(operator, Dialogue::CardName { editing });
                Some(Reply::text("Enter the card name"))
            }
            Dialogue::CardName { .. } | Dialogue::PlayerName { .. } => {
                Some(Reply::text("You are already at the first step."))
            }
            Dialogue::Idle | Dialogue::Control(_) => None,
        }
    }

    // Cards

    fn card_list(&self) -> Reply {
        match self.store.list_cards() {
            Ok(cards) if cards.is_empty() => Reply::text("The card list is empty."),
            Ok(cards) => {
                let names: Vec<&str> = cards.iter().map(|c| c.name.as_str()).collect();
                Reply::text(format!("Cards:\n\n{}", names.join("\n")))
            }
            Err(e) => lookup_failed("cards", e),
        }
    }

    fn show_card(&self, name: &str) -> Reply {
        match self.store.find_card(name) {
            Ok(Some(card)) => {
                let reply = Reply::text(card.name.clone())
                    .button("Edit", format!("change-card_{}", card.name))
                    .button("Delete", format!("delete-card_{}", card.name));
                match card.image {
                    Some(image) => reply.photo(image),
                    None => reply,
                }
            }
            Ok(None) => Reply::text(format!("Card '{name}' not found.")),
            Err(e) => lookup_failed("the card", e),
        }
    }

    fn begin_card_edit(&mut self, operator: OperatorId, name: &str) -> Reply {
        match self.store.find_card(name) {
            Ok(Some(card)) => {
                self.reset_dialogue(operator);
                self.set_dialogue(
                    operator,
                    Dialogue::CardName {
                        editing: Some(card),
                    },
                );
                Reply::text(format!("Enter the new card name ({KEEP} keeps the current one):"))
            }
            Ok(None) => Reply::text(format!("Card '{name}' not found.")),
            Err(e) => lookup_failed("the card", e),
        }
    }

    fn card_name_input(
        &mut self,
        operator: OperatorId,
        text: &str,
        editing: Option<Card>,
    ) -> Reply {
        let name = if text == KEEP {
            match &editing {
                Some(card) => card.name.clone(),
                None => return Reply::text(CANNOT_SKIP),
            }
        } else {
            match validate_name(text) {
                Ok(name) => name.to_string(),
                Err(e) => return Reply::text(e.to_string()),
            }
        };
        self.set_dialogue(operator, Dialogue::CardImage { name, editing });
        Reply::text(SEND_IMAGE)
    }

    fn save_card(
        &mut self,
        operator: OperatorId,
        name: String,
        image: String,
        editing: Option<Card>,
    ) -> Reply {
        self.set_dialogue(operator, Dialogue::Idle);
        let draft = CardDraft { name, image };
        let result = match &editing {
            Some(card) => self.store.update_card(&card.name, &draft),
            None => self.store.create_card(&draft),
        };
        saved_reply(result.map(|card| log::info!("Card '{}' saved", card.name)))
    }

    fn delete_card(&self, name: &str) -> Reply {
        match self.store.delete_card(name) {
            Ok(true) => Reply::text(format!("Card '{name}' deleted.")),
            Ok(false) => Reply::text(format!("Card '{name}' not found or not deleted.")),
            Err(e) => lookup_failed("the card", e),
        }
    }

    // Players

    fn player_list(&self) -> Reply {
        match self.store.list_players(None) {
            Ok(players) if players.is_empty() => Reply::text("The player list is empty."),
            Ok(players) => {
                let names: Vec<&str> = players.iter().map(|p| p.name.as_str()).collect();
                Reply::text(format!("Players:\n\n{}", names.join("\n")))
            }
            Err(e) => lookup_failed("players", e),
        }
    }

    fn show_player(&self, name: &str) -> Reply {
        match self.store.find_player(name) {
            Ok(Some(player)) => Reply::text(player.summary())
                .button("Rename", format!("change-player_{}", player.name))
                .button("Toggle status", format!("change-status_{}", player.name))
                .button("Delete", format!("delete-player_{}", player.name)),
            Ok(None) => Reply::text(format!("Player '{name}' not found.")),
            Err(e) => lookup_failed("the player", e),
        }
    }

    fn begin_player_rename(&mut self, operator: OperatorId, name: &str) -> Reply {
        match self.store.find_player(name) {
            Ok(Some(player)) => {
                self.reset_dialogue(operator);
                self.set_dialogue(
                    operator,
                    Dialogue::PlayerName {
                        editing: Some(player.name),
                    },
                );
                Reply::text("Enter the new callsign").keyboard(Keyboard::Remove)
            }
            Ok(None) => Reply::text(format!("Player '{name}' not found.")),
            Err(e) => lookup_failed("the player", e),
        }
    }

    fn player_name_input(
        &mut self,
        operator: OperatorId,
        text: &str,
        editing: Option<String>,
    ) -> Reply {
        let name = if text == KEEP {
            match &editing {
                Some(current) => current.clone(),
                None => return Reply::text(CANNOT_SKIP),
            }
        } else {
            match validate_name(text) {
                Ok(name) => name.to_string(),
                Err(e) => return Reply::text(e.to_string()),
            }
        };
        self.set_dialogue(operator, Dialogue::Idle);
        let result = match &editing {
            Some(current) => self.store.rename_player(current, &name),
            None => self.store.create_player(&name).map(|_| ()),
        };
        saved_reply(result)
    }

    fn toggle_player_status(&self, name: &str) -> Reply {
        match self.store.toggle_status(name) {
            Ok(player) => Reply::text(format!(
                "Status updated: {} is now {}",
                player.name,
                player.status.label()
            )),
            Err(ConsoleError::NotFound(_)) => Reply::text(format!("Player '{name}' not found.")),
            Err(e) => lookup_failed("the player", e),
        }
    }

    fn delete_player(&self, name: &str) -> Reply {
        match self.store.delete_player(name) {
            Ok(true) => Reply::text(format!("Player '{name}' deleted.")),
            Ok(false) => Reply::text(format!("Player '{name}' not found or not deleted.")),
            Err(e) => lookup_failed("the player", e),
        }
    }

    // Reports

    fn report(&self, status: &str) -> Reply {
        let Ok(status) = status.parse::<PlayerStatus>() else {
            return Reply::text("Unknown report.");
        };
        match status_report(self.store.as_ref(), status) {
            Ok(report) => Reply::text(report.to_text()),
            Err(e) => lookup_failed("the report", e),
        }
    }
}
