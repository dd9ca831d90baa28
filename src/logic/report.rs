//! Status reports: who is in each bucket, as chat text or CSV.

use crate::error::Result;
use crate::models::{Player, PlayerStatus};
use crate::store::Roster;
use serde::Serialize;

/// Players sharing one status, in roster order.
#[derive(Clone, Debug, Serialize)]
pub struct StatusReport {
    pub status: PlayerStatus,
    pub players: Vec<Player>,
}

#[derive(Serialize)]
struct ReportRow<'a> {
    name: &'a str,
    count: u32,
    status: &'static str,
    direction: &'static str,
    updated: String,
}

pub fn status_report<R: Roster + ?Sized>(roster: &R, status: PlayerStatus) -> Result<StatusReport> {
    Ok(StatusReport {
        status,
        players: roster.list_players(Some(status))?,
    })
}

impl StatusReport {
    pub fn to_text(&self) -> String {
        let header = format!("Roster report\nStatus: {}\n\n", self.status.label());
        if self.players.is_empty() {
            return header + "No players with this status.";
        }
        let lines: Vec<String> = self
            .players
            .iter()
            .map(|p| format!("{} | {} | {}", p.name, p.count, p.direction.label()))
            .collect();
        header + &lines.join("\n")
    }

    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        for p in &self.players {
            wtr.serialize(ReportRow {
                name: &p.name,
                count: p.count,
                status: p.status.as_str(),
                direction: p.direction.as_str(),
                updated: p.updated.to_rfc3339(),
            })?;
        }
        // With no rows serde never writes the header, so emit it by hand.
        if self.players.is_empty() {
            wtr.write_record(["name", "count", "status", "direction", "updated"])?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;
        Ok(bytes)
    }
}
