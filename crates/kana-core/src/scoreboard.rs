//! Scoreboard records and their table rendering.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One `GET api/scoreboard` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub player: String,
    pub score: u64,
}

impl ScoreRecord {
    pub fn new(player: impl Into<String>, score: u64) -> Self {
        Self {
            player: player.into(),
            score,
        }
    }
}

/// A rendered table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRow {
    pub cells: [String; 2],
}

impl fmt::Display for ScoreRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.cells[0], self.cells[1])
    }
}

/// Parse a `GET api/scoreboard` body
pub fn parse_scoreboard(body: &str) -> Result<Vec<ScoreRecord>, serde_json::Error> {
    serde_json::from_str(body)
}

/// One row per record, in the order given
pub fn render_rows(records: &[ScoreRecord]) -> Vec<ScoreRow> {
    records
        .iter()
        .map(|r| ScoreRow {
            cells: [r.player.clone(), r.score.to_string()],
        })
        .collect()
}

/// Rows joined by newlines; empty input renders an empty table
pub fn render_table(records: &[ScoreRecord]) -> String {
    render_rows(records)
        .iter()
        .map(|row| row.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
