//! Persistence seams. Only the store talks to the database; everything else
//! goes through [`Roster`] and [`Catalog`].

mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::logic::AdjustmentReport;
use crate::models::{Card, CardDraft, Player, PlayerStatus};

/// Player roster storage.
pub trait Roster {
    /// Names of every `Normal` player, in roster order.
    fn list_eligible_player_names(&self) -> Result<Vec<String>>;

    fn find_player(&self, name: &str) -> Result<Option<Player>>;

    /// Increment `complement` and decrement `selected` in one transaction.
    /// Names missing from the roster are skipped.
    fn apply_partitioned_update(
        &self,
        selected: &[String],
        complement: &[String],
    ) -> Result<AdjustmentReport>;

    fn create_player(&self, name: &str) -> Result<Player>;

    fn rename_player(&self, old_name: &str, new_name: &str) -> Result<()>;

    /// Returns false when no such player existed.
    fn delete_player(&self, name: &str) -> Result<bool>;

    /// All players, or only those with `status`.
    fn list_players(&self, status: Option<PlayerStatus>) -> Result<Vec<Player>>;

    /// Normal goes on leave, anything else back to Normal. Coming back from leave
    /// resets the direction to Neutral.
    fn toggle_status(&self, name: &str) -> Result<Player>;
}

/// Card catalog storage.
pub trait Catalog {
    fn list_cards(&self) -> Result<Vec<Card>>;

    fn find_card(&self, name: &str) -> Result<Option<Card>>;

    fn create_card(&self, draft: &CardDraft) -> Result<Card>;

    /// Replace name and image of the card currently called `original_name`.
    fn update_card(&self, original_name: &str, draft: &CardDraft) -> Result<Card>;

    fn delete_card(&self, name: &str) -> Result<bool>;
}
