//! Reference cards shown to everyone: a name and an image.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalog card. `image` is an opaque file id owned by the chat platform.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub name: String,
    pub image: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Field values for creating or replacing a card.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CardDraft {
    pub name: String,
    pub image: String,
}
