//! SQLite implementation of the roster and catalog.

use crate::error::{ConsoleError, Result};
use crate::logic::AdjustmentReport;
use crate::models::{
    validate_name, Card, CardDraft, Direction, Player, PlayerStatus, ESCALATION_THRESHOLD,
};
use crate::store::{Catalog, Roster};
use chrono::Utc;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row, ToSql};
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = include_str!("../../migrations/001_roster.sql");

const PLAYER_COLUMNS: &str = "name, count, status, direction, created, updated";
const CARD_COLUMNS: &str = "name, image, created, updated";

impl ToSql for PlayerStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PlayerStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|_| FromSqlError::InvalidType)
    }
}

impl ToSql for Direction {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Direction {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|_| FromSqlError::InvalidType)
    }
}

fn player_from_row(row: &Row<'_>) -> rusqlite::Result<Player> {
    Ok(Player {
        name: row.get(0)?,
        count: row.get(1)?,
        status: row.get(2)?,
        direction: row.get(3)?,
        created: row.get(4)?,
        updated: row.get(5)?,
    })
}

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<Card> {
    Ok(Card {
        name: row.get(0)?,
        image: row.get(1)?,
        created: row.get(2)?,
        updated: row.get(3)?,
    })
}

/// `?first, ?first+1, ...` for an `IN (...)` list of `count` names.
fn placeholders(first: usize, count: usize) -> String {
    (first..first + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Unique-constraint failures become `Duplicate(name)`.
fn map_unique(err: rusqlite::Error, name: &str) -> ConsoleError {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            ConsoleError::Duplicate(name.to_string())
        }
        other => other.into(),
    }
}

/// Roster and catalog in one SQLite database behind a mutex.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::from_connection(conn)
    }

    /// Private in-memory database (tests, demos).
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wrap an already-open connection. The schema is applied if missing.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| ConsoleError::LockPoisoned)
    }

    fn player_by_name(conn: &Connection, name: &str) -> Result<Option<Player>> {
        let player = conn
            .query_row(
                &format!("SELECT {PLAYER_COLUMNS} FROM players WHERE name = ?1"),
                params![name],
                player_from_row,
            )
            .optional()?;
        Ok(player)
    }

    fn card_by_name(conn: &Connection, name: &str) -> Result<Option<Card>> {
        let card = conn
            .query_row(
                &format!("SELECT {CARD_COLUMNS} FROM cards WHERE name = ?1"),
                params![name],
                card_from_row,
            )
            .optional()?;
        Ok(card)
    }
}

impl Roster for SqliteStore {
    fn list_eligible_player_names(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT name FROM players WHERE status = ?1 ORDER BY id")?;
        let names = stmt
            .query_map(params![PlayerStatus::Normal], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    fn find_player(&self, name: &str) -> Result<Option<Player>> {
        let conn = self.conn()?;
        Self::player_by_name(&conn, name)
    }

    fn apply_partitioned_update(
        &self,
        selected: &[String],
        complement: &[String],
    ) -> Result<AdjustmentReport> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let now = Utc::now();
        let mut report = AdjustmentReport::default();

        if !complement.is_empty() {
            let sql = format!(
                "UPDATE players SET
                    count = count + 1,
                    status = CASE WHEN count + 1 > ?1 THEN ?2 ELSE status END,
                    direction = ?3,
                    updated = ?4
                 WHERE name IN ({})",
                placeholders(5, complement.len())
            );
            let fixed: [&dyn ToSql; 4] = [
                &ESCALATION_THRESHOLD,
                &PlayerStatus::Escalated,
                &Direction::Increment,
                &now,
            ];
            let names = complement.iter().map(|n| n as &dyn ToSql);
            report.incremented = tx.execute(&sql, params_from_iter(fixed.into_iter().chain(names)))?;
        }

        if !selected.is_empty() {
            let sql = format!(
                "UPDATE players SET
                    count = CASE WHEN count - 1 < 0 THEN 0 ELSE count - 1 END,
                    direction = CASE WHEN count - 1 < 0 THEN ?1 ELSE ?2 END,
                    updated = ?3
                 WHERE name IN ({})",
                placeholders(4, selected.len())
            );
            let fixed: [&dyn ToSql; 3] = [&Direction::Clamped, &Direction::Decrement, &now];
            let names = selected.iter().map(|n| n as &dyn ToSql);
            report.decremented = tx.execute(&sql, params_from_iter(fixed.into_iter().chain(names)))?;
        }

        tx.commit()?;
        Ok(report)
    }

    fn create_player(&self, name: &str) -> Result<Player> {
        let name = validate_name(name)?;
        let player = Player::new(name);
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO players (name, count, status, direction, created, updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                player.name,
                player.count,
                player.status,
                player.direction,
                player.created,
                player.updated
            ],
        )
        .map_err(|e| map_unique(e, name))?;
        Ok(player)
    }

    fn rename_player(&self, old_name: &str, new_name: &str) -> Result<()> {
        let new_name = validate_name(new_name)?;
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE players SET name = ?1, updated = ?2 WHERE name = ?3",
                params![new_name, Utc::now(), old_name],
            )
            .map_err(|e| map_unique(e, new_name))?;
        if changed == 0 {
            return Err(ConsoleError::NotFound(old_name.to_string()));
        }
        Ok(())
    }

    fn delete_player(&self, name: &str) -> Result<bool> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM players WHERE name = ?1", params![name])?;
        Ok(removed > 0)
    }

    fn list_players(&self, status: Option<PlayerStatus>) -> Result<Vec<Player>> {
        let conn = self.conn()?;
        let players = match status {
            Some(status) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {PLAYER_COLUMNS} FROM players WHERE status = ?1 ORDER BY id"
                ))?;
                let rows = stmt.query_map(params![status], player_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt =
                    conn.prepare(&format!("SELECT {PLAYER_COLUMNS} FROM players ORDER BY id"))?;
                let rows = stmt.query_map([], player_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(players)
    }

    fn toggle_status(&self, name: &str) -> Result<Player> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE players SET
                status = CASE WHEN status = ?1 THEN ?2 ELSE ?1 END,
                direction = CASE WHEN status = ?2 THEN ?3 ELSE direction END,
                updated = ?4
             WHERE name = ?5",
            params![
                PlayerStatus::Normal,
                PlayerStatus::OnLeave,
                Direction::Neutral,
                Utc::now(),
                name
            ],
        )?;
        if changed == 0 {
            return Err(ConsoleError::NotFound(name.to_string()));
        }
        Self::player_by_name(&conn, name)?.ok_or_else(|| ConsoleError::NotFound(name.to_string()))
    }
}

impl Catalog for SqliteStore {
    fn list_cards(&self) -> Result<Vec<Card>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {CARD_COLUMNS} FROM cards ORDER BY id"))?;
        let cards = stmt
            .query_map([], card_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cards)
    }

    fn find_card(&self, name: &str) -> Result<Option<Card>> {
        let conn = self.conn()?;
        Self::card_by_name(&conn, name)
    }

    fn create_card(&self, draft: &CardDraft) -> Result<Card> {
        let name = validate_name(&draft.name)?;
        let now = Utc::now();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO cards (name, image, created, updated) VALUES (?1, ?2, ?3, ?3)",
            params![name, draft.image, now],
        )
        .map_err(|e| map_unique(e, name))?;
        Ok(Card {
            name: name.to_string(),
            image: Some(draft.image.clone()),
            created: now,
            updated: now,
        })
    }

    fn update_card(&self, original_name: &str, draft: &CardDraft) -> Result<Card> {
        let name = validate_name(&draft.name)?;
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE cards SET name = ?1, image = ?2, updated = ?3 WHERE name = ?4",
                params![name, draft.image, Utc::now(), original_name],
            )
            .map_err(|e| map_unique(e, name))?;
        if changed == 0 {
            return Err(ConsoleError::NotFound(original_name.to_string()));
        }
        Self::card_by_name(&conn, name)?.ok_or_else(|| ConsoleError::NotFound(name.to_string()))
    }

    fn delete_card(&self, name: &str) -> Result<bool> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM cards WHERE name = ?1", params![name])?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_numbered_from_first() {
        assert_eq!(placeholders(4, 3), "?4, ?5, ?6");
        assert_eq!(placeholders(1, 1), "?1");
    }

    #[test]
    fn toggle_from_leave_resets_direction() {
        let store = SqliteStore::in_memory().unwrap();
        store.create_player("Echo").unwrap();
        store
            .apply_partitioned_update(&[], &["Echo".to_string()])
            .unwrap();

        let on_leave = store.toggle_status("Echo").unwrap();
        assert_eq!(on_leave.status, PlayerStatus::OnLeave);
        assert_eq!(on_leave.direction, Direction::Increment);

        let back = store.toggle_status("Echo").unwrap();
        assert_eq!(back.status, PlayerStatus::Normal);
        assert_eq!(back.direction, Direction::Neutral);
    }
}
