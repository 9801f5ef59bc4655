//! HTTP request and response bodies.
//!
//! The session channel messages live in `kana_core::channel`; timer bodies are
//! `kana_core::TimerStart` / `kana_core::TimerStop`.

use serde::{Deserialize, Serialize};

/// `GET game/timer` query
#[derive(Debug, Clone, Deserialize)]
pub struct TimerQuery {
    pub action: String,
    pub tid: Option<String>,
}

/// `?p=<player>` query
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerQuery {
    pub p: String,
}

/// A player's position on the scoreboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankResponse {
    pub player: String,
    /// `MM:SS`
    pub time: String,
    /// 1-based
    pub rank: usize,
}

/// Anti-forgery token for the completion form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrfResponse {
    pub token: String,
}

/// Completion form posted when no session channel carried the game
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreForm {
    #[serde(rename = "player-time")]
    pub player_time: String,
    #[serde(rename = "csrf-token", default)]
    pub csrf_token: Option<String>,
}

/// Location of a player's scoreboard page
pub fn scoreboard_location(player: &str) -> String {
    format!("/scoreboard?p={}", player)
}
