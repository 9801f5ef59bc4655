//! Engine events and controller effects.
//!
//! [`GameEvent`]s describe what happened inside the match engine.
//! [`Effect`]s are what the controller asks its host (browser driver, test
//! harness) to do in response: render, schedule, send, navigate.

use crate::channel::ClientEvent;
use crate::grid::{CellIndex, Visibility};
use serde::{Deserialize, Serialize};

/// Identifies one scheduled conceal; stale tokens are ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConcealToken(pub u64);

/// Events produced by the match engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A hidden cell was turned face up
    CellRevealed { cell: CellIndex },

    /// A second flip did not match its held partner
    Mismatch { first: CellIndex, second: CellIndex },

    /// Two cells were matched and stay face up
    PairMatched {
        first: CellIndex,
        second: CellIndex,
        glyph: String,
        romaji: String,
        score: u32,
    },

    /// The pair window closes after `delay_ms`
    ConcealScheduled {
        token: ConcealToken,
        cells: Vec<CellIndex>,
        delay_ms: u64,
    },

    /// Unmatched cells were turned face down again
    CellsConcealed { cells: Vec<CellIndex> },

    /// Every pair has been found
    GameCompleted { score: u32 },
}

/// Instructions for the host, returned by the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Effect {
    // ==================== Rendering ====================
    /// Show a cell in its new visibility
    RenderCell {
        cell: CellIndex,
        visibility: Visibility,
    },
    /// Update the clock display
    RenderTimer { text: String },
    /// Show the end-of-game result
    ShowResult { score: u32, elapsed: String },
    /// Something unexpected happened the player should know about
    ShowAnomaly { message: String },

    // ==================== Scheduling ====================
    /// Call `conceal_due(token)` after `delay_ms`
    ScheduleConceal { token: ConcealToken, delay_ms: u64 },
    /// Call `tick` every `interval_ms`
    StartTicking { interval_ms: u64 },
    /// Stop calling `tick`
    StopTicking,

    // ==================== Network ====================
    /// `GET timer?action=start`, then call `timer_started`
    RequestTimerStart,
    /// `GET timer?action=stop&tid=<timer_id>`, then call `timer_stopped`
    RequestTimerStop { timer_id: String },
    /// Open the session channel
    OpenChannel,
    /// Send an event on the session channel
    Send { event: ClientEvent },
    /// Post the completion report to the scoreboard
    SubmitScore {
        player_time: String,
        csrf_token: Option<String>,
    },
    /// Leave the game page
    Navigate { location: String },
}
