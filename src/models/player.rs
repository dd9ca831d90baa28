//! Player, PlayerStatus and Direction.

use crate::error::{ConsoleError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A player whose count passes this value after an increment is escalated.
pub const ESCALATION_THRESHOLD: u32 = 3;

/// Shortest accepted card or player name (in characters, after trimming).
pub const MIN_NAME_LEN: usize = 3;
/// Longest accepted card or player name.
pub const MAX_NAME_LEN: usize = 150;

/// Trim `text` and check it is an acceptable card or player name.
pub fn validate_name(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    let len = trimmed.chars().count();
    if (MIN_NAME_LEN..=MAX_NAME_LEN).contains(&len) {
        Ok(trimmed)
    } else {
        Err(ConsoleError::InvalidName)
    }
}

/// Which report bucket a player belongs to. Only `Normal` players take part in control.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    #[default]
    Normal,
    OnLeave,
    Escalated,
}

impl PlayerStatus {
    pub const ALL: [PlayerStatus; 3] = [Self::Normal, Self::OnLeave, Self::Escalated];

    pub fn as_str(self) -> &'static str {
        match self {
            PlayerStatus::Normal => "normal",
            PlayerStatus::OnLeave => "on_leave",
            PlayerStatus::Escalated => "escalated",
        }
    }

    /// Human-readable name used in reports and player cards.
    pub fn label(self) -> &'static str {
        match self {
            PlayerStatus::Normal => "Normal",
            PlayerStatus::OnLeave => "On leave",
            PlayerStatus::Escalated => "Escalated",
        }
    }

    /// Manual status switch: Normal goes on leave, anything else comes back to Normal.
    pub fn toggled(self) -> Self {
        match self {
            PlayerStatus::Normal => PlayerStatus::OnLeave,
            PlayerStatus::OnLeave | PlayerStatus::Escalated => PlayerStatus::Normal,
        }
    }
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayerStatus {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self> {
        PlayerStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ConsoleError::NotFound(format!("status {s}")))
    }
}

/// Polarity of the most recent adjustment. Informational only.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Never adjusted, or reset after returning from leave.
    #[default]
    Neutral,
    Increment,
    Decrement,
    /// A decrement was requested at count 0 and pinned there.
    Clamped,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Self::Neutral,
        Self::Increment,
        Self::Decrement,
        Self::Clamped,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Neutral => "neutral",
            Direction::Increment => "increment",
            Direction::Decrement => "decrement",
            Direction::Clamped => "clamped",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::Neutral => "-",
            Direction::Increment => "+1",
            Direction::Decrement => "-1",
            Direction::Clamped => "0 (clamped)",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self> {
        Direction::ALL
            .into_iter()
            .find(|direction| direction.as_str() == s)
            .ok_or_else(|| ConsoleError::NotFound(format!("direction {s}")))
    }
}

/// A tracked player on the roster.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    /// Consecutive-absence counter; never negative.
    pub count: u32,
    pub status: PlayerStatus,
    pub direction: Direction,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Player {
    /// Create a new player with the given name: count 0, Normal, Neutral.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            count: 0,
            status: PlayerStatus::Normal,
            direction: Direction::Neutral,
            created: now,
            updated: now,
        }
    }

    /// Absent from a control round: count goes up, escalating past the threshold.
    pub fn record_increment(&mut self) {
        self.count += 1;
        if self.count > ESCALATION_THRESHOLD {
            self.status = PlayerStatus::Escalated;
        }
        self.direction = Direction::Increment;
        self.updated = Utc::now();
    }

    /// Present in a control round: count goes down, pinned at zero.
    pub fn record_decrement(&mut self) {
        if self.count == 0 {
            self.direction = Direction::Clamped;
        } else {
            self.count -= 1;
            self.direction = Direction::Decrement;
        }
        self.updated = Utc::now();
    }

    /// One-line summary shown to operators: `name | count | direction | status`.
    pub fn summary(&self) -> String {
        format!(
            "{} | {} | {} | {}",
            self.name,
            self.count,
            self.direction.label(),
            self.status.label()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrement_at_zero_clamps() {
        let mut p = Player::new("Alpha");
        p.record_decrement();
        assert_eq!(p.count, 0);
        assert_eq!(p.direction, Direction::Clamped);
    }

    #[test]
    fn increment_escalates_only_past_threshold() {
        let mut p = Player::new("Bravo");
        p.count = 2;
        p.record_increment();
        assert_eq!((p.count, p.status), (3, PlayerStatus::Normal));
        p.record_increment();
        assert_eq!((p.count, p.status), (4, PlayerStatus::Escalated));
        p.record_decrement();
        assert_eq!(p.status, PlayerStatus::Escalated);
    }

    #[test]
    fn name_bounds_are_inclusive() {
        assert!(validate_name("ab").is_err());
        assert_eq!(validate_name("  abc  ").unwrap(), "abc");
        assert!(validate_name(&"x".repeat(150)).is_ok());
        assert!(validate_name(&"x".repeat(151)).is_err());
    }
}
