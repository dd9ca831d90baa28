//! Card browser available to every private chat.

use super::{Console, Event, Reply};
use crate::store::{Catalog, Roster};

/// Menu label that lists the catalog for non-admins.
pub const CATALOG_LABEL: &str = "Card catalog";
/// Message prefix to open one card: `view_<name>`.
pub const VIEW_PREFIX: &str = "view_";

impl<S: Roster + Catalog> Console<S> {
    pub(super) fn public_event(&self, event: &Event) -> Option<Reply> {
        let Event::Text { text } = event else {
            return None;
        };
        let text = text.trim();
        if text == "/start" || text == CATALOG_LABEL {
            return Some(self.catalog_listing());
        }
        let name = text.strip_prefix(VIEW_PREFIX)?.trim();
        let reply = match self.store.find_card(name) {
            Ok(Some(card)) => match card.image {
                Some(image) => Reply::text(card.name).photo(image),
                None => Reply::text(card.name),
            },
            Ok(None) => Reply::text("No card with that name."),
            Err(e) => {
                log::warn!("Card lookup for {:?} failed: {}", name, e);
                Reply::text("The catalog is unavailable right now, try again later.")
            }
        };
        Some(reply)
    }

    fn catalog_listing(&self) -> Reply {
        match self.store.list_cards() {
            Ok(cards) if cards.is_empty() => Reply::text("The card list is empty."),
            Ok(cards) => {
                let names: Vec<&str> = cards.iter().map(|c| c.name.as_str()).collect();
                Reply::text(format!(
                    "Here are the cards. To see one in detail send {VIEW_PREFIX}<name>:\n\n{}",
                    names.join("\n")
                ))
            }
            Err(e) => {
                log::warn!("Card listing failed: {}", e);
                Reply::text("The catalog is unavailable right now, try again later.")
            }
        }
    }
}
