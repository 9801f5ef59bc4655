//! The two-click match state machine.
//!
//! ```text
//! Idle --click--> OneSelected --click--> Resolving --conceal_due--> Idle
//!                                    \
//!                                     `--(last pair)--> Completed
//! ```
//!
//! While `Resolving`, one first flip may be queued; when the conceal fires
//! the engine moves to `OneSelected` holding it instead of `Idle`.

use crate::actions::{ConcealToken, GameEvent};
use crate::game::GameError;
use crate::grid::{CellIndex, TileGrid, Visibility};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long a flipped pair stays face up before it is resolved
pub const CONCEAL_DELAY: Duration = Duration::from_millis(200);

/// Engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchState {
    /// No cell held
    Idle,

    /// One cell flipped, waiting for its partner
    OneSelected { held: CellIndex },

    /// Two cells flipped, waiting for the conceal delay
    Resolving {
        first: CellIndex,
        second: CellIndex,
        /// First flip of the next turn, made during the delay
        queued: Option<CellIndex>,
        token: ConcealToken,
    },

    /// Every pair found; absorbs all further input
    Completed,
}

/// Score, held selection and grid for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchEngine {
    grid: TileGrid,
    state: MatchState,
    score: u32,
    max_score: u32,
    conceal_delay: Duration,
    next_token: u64,
}

impl MatchEngine {
    pub fn new(grid: TileGrid) -> Self {
        Self::with_delay(grid, CONCEAL_DELAY)
    }

    pub fn with_delay(grid: TileGrid, conceal_delay: Duration) -> Self {
        let max_score = (grid.len() / 2) as u32;
        Self {
            grid,
            state: MatchState::Idle,
            score: 0,
            max_score,
            conceal_delay,
            next_token: 0,
        }
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn max_score(&self) -> u32 {
        self.max_score
    }

    pub fn is_completed(&self) -> bool {
        self.state == MatchState::Completed
    }

    /// Handle a click on `cell`.
    ///
    /// Clicks on selected or matched cells and clicks after completion are
    /// accepted and produce no events. Only an index outside the grid is an
    /// error.
    pub fn click(&mut self, cell: CellIndex) -> Result<Vec<GameEvent>, GameError> {
        let target = self.grid.cell(cell)?;
        if self.is_completed() || target.visibility != Visibility::Hidden {
            return Ok(Vec::new());
        }

        let mut events = Vec::new();

        match self.state {
            MatchState::Completed => {}

            MatchState::Idle => {
                self.grid.reveal(cell)?;
                events.push(GameEvent::CellRevealed { cell });
                self.state = MatchState::OneSelected { held: cell };
            }

            MatchState::OneSelected { held } => {
                self.grid.reveal(cell)?;
                events.push(GameEvent::CellRevealed { cell });
                events.extend(self.resolve_pair(held, cell)?);
            }

            MatchState::Resolving {
                first,
                second,
                queued: None,
                token,
            } => {
                self.grid.reveal(cell)?;
                events.push(GameEvent::CellRevealed { cell });
                self.state = MatchState::Resolving {
                    first,
                    second,
                    queued: Some(cell),
                    token,
                };
            }

            // A turn is already queued; it can't be compared until the
            // previous pair is concealed.
            MatchState::Resolving {
                queued: Some(_), ..
            } => {}
        }

        Ok(events)
    }

    fn resolve_pair(
        &mut self,
        held: CellIndex,
        cell: CellIndex,
    ) -> Result<Vec<GameEvent>, GameError> {
        let mut events = Vec::new();
        let first = self.grid.cell(held)?;
        let second = self.grid.cell(cell)?;

        if first.pairs_with(second) {
            let glyph = first.glyph().to_string();
            let romaji = first.romaji().to_string();

            self.grid.mark_matched(held)?;
            self.grid.mark_matched(cell)?;
            debug_assert!(self.score < self.max_score, "match after completion");
            self.score += 1;

            events.push(GameEvent::PairMatched {
                first: held,
                second: cell,
                glyph,
                romaji,
                score: self.score,
            });

            if self.score == self.max_score {
                self.state = MatchState::Completed;
                events.push(GameEvent::GameCompleted { score: self.score });
                return Ok(events);
            }
        } else {
            events.push(GameEvent::Mismatch {
                first: held,
                second: cell,
            });
        }

        let token = ConcealToken(self.next_token);
        self.next_token += 1;
        self.state = MatchState::Resolving {
            first: held,
            second: cell,
            queued: None,
            token,
        };
        events.push(GameEvent::ConcealScheduled {
            token,
            cells: vec![held, cell],
            delay_ms: self.conceal_delay.as_millis() as u64,
        });

        Ok(events)
    }

    /// The conceal delay for `token` has elapsed.
    ///
    /// Unmatched cells of the resolved pair are turned face down and the held
    /// selection is cleared (or replaced by the queued flip). Stale tokens
    /// are ignored.
    pub fn conceal_due(&mut self, token: ConcealToken) -> Vec<GameEvent> {
        let MatchState::Resolving {
            first,
            second,
            queued,
            token: pending,
        } = self.state
        else {
            return Vec::new();
        };
        if pending != token {
            return Vec::new();
        }

        let mut concealed = Vec::new();
        for cell in [first, second] {
            if self.grid.conceal(cell).is_ok() {
                concealed.push(cell);
            }
        }

        self.state = match queued {
            Some(held) => MatchState::OneSelected { held },
            None => MatchState::Idle,
        };

        if concealed.is_empty() {
            Vec::new()
        } else {
            vec![GameEvent::CellsConcealed { cells: concealed }]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Cell, Side};
    use pretty_assertions::assert_eq;

    /// あ a い i う u, laid out so partners are not adjacent
    fn engine() -> MatchEngine {
        MatchEngine::new(TileGrid::from_cells(vec![
            Cell::new("あ", "a", Side::Glyph),
            Cell::new("i", "い", Side::Romaji),
            Cell::new("a", "あ", Side::Romaji),
            Cell::new("う", "u", Side::Glyph),
            Cell::new("い", "i", Side::Glyph),
            Cell::new("u", "う", Side::Romaji),
        ]))
    }

    fn scheduled_token(events: &[GameEvent]) -> ConcealToken {
        events
            .iter()
            .find_map(|e| match e {
                GameEvent::ConcealScheduled { token, .. } => Some(*token),
                _ => None,
            })
            .expect("conceal should be scheduled")
    }

    #[test]
    fn test_first_click_holds_cell() {
        let mut engine = engine();
        let events = engine.click(0).unwrap();

        assert_eq!(events, vec![GameEvent::CellRevealed { cell: 0 }]);
        assert_eq!(engine.state(), MatchState::OneSelected { held: 0 });
    }

    #[test]
    fn test_double_click_never_self_matches() {
        let mut engine = engine();
        engine.click(0).unwrap();
        let events = engine.click(0).unwrap();

        assert!(events.is_empty());
        assert_eq!(engine.state(), MatchState::OneSelected { held: 0 });
        assert_eq!(engine.score(), 0);
    }

    #[test]
    fn test_mismatch_conceals_after_delay() {
        let mut engine = engine();
        engine.click(0).unwrap();
        let events = engine.click(1).unwrap();

        assert!(events.contains(&GameEvent::Mismatch {
            first: 0,
            second: 1
        }));
        assert!(events.contains(&GameEvent::ConcealScheduled {
            token: ConcealToken(0),
            cells: vec![0, 1],
            delay_ms: 200,
        }));
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.grid().count(Visibility::Selected), 2);

        let events = engine.conceal_due(ConcealToken(0));
        assert_eq!(events, vec![GameEvent::CellsConcealed { cells: vec![0, 1] }]);
        assert_eq!(engine.grid().count(Visibility::Hidden), 6);
        assert_eq!(engine.state(), MatchState::Idle);
    }

    #[test]
    fn test_match_by_stored_relation() {
        let mut engine = engine();
        engine.click(2).unwrap();
        let events = engine.click(0).unwrap();

        assert!(events.contains(&GameEvent::PairMatched {
            first: 2,
            second: 0,
            glyph: "あ".to_string(),
            romaji: "a".to_string(),
            score: 1,
        }));
        assert_eq!(engine.grid().count(Visibility::Matched), 2);

        // Nothing left to conceal, but the selection is released
        let token = scheduled_token(&events);
        assert!(engine.conceal_due(token).is_empty());
        assert_eq!(engine.state(), MatchState::Idle);
    }

    #[test]
    fn test_clicking_matched_cell_is_noop() {
        let mut engine = engine();
        engine.click(0).unwrap();
        let events = engine.click(2).unwrap();
        engine.conceal_due(scheduled_token(&events));

        let before = engine.grid().clone();
        assert!(engine.click(0).unwrap().is_empty());
        assert!(engine.click(2).unwrap().is_empty());
        assert_eq!(engine.grid(), &before);
        assert_eq!(engine.state(), MatchState::Idle);
    }

    #[test]
    fn test_first_click_during_delay_is_queued() {
        let mut engine = engine();
        engine.click(0).unwrap();
        let events = engine.click(1).unwrap();
        let token = scheduled_token(&events);

        // Queued as the next hold
        assert_eq!(engine.click(3).unwrap(), vec![GameEvent::CellRevealed { cell: 3 }]);
        // No comparison until the pending pair is concealed
        assert!(engine.click(5).unwrap().is_empty());
        assert!(engine.grid().cell(5).unwrap().is_hidden());

        engine.conceal_due(token);
        assert_eq!(engine.state(), MatchState::OneSelected { held: 3 });

        let events = engine.click(5).unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::PairMatched { glyph, .. } if glyph == "う")));
    }

    #[test]
    fn test_stale_token_is_ignored() {
        let mut engine = engine();
        engine.click(0).unwrap();
        engine.click(1).unwrap();

        assert!(engine.conceal_due(ConcealToken(42)).is_empty());
        assert_eq!(engine.grid().count(Visibility::Selected), 2);
    }

    #[test]
    fn test_completion_fires_once() {
        let mut engine = engine();
        let mut completions = 0;
        let mut last_score = 0;

        for (a, b) in [(0, 2), (1, 4), (3, 5)] {
            let mut events = engine.click(a).unwrap();
            events.extend(engine.click(b).unwrap());
            for event in &events {
                if let GameEvent::ConcealScheduled { token, .. } = event {
                    engine.conceal_due(*token);
                }
                if matches!(event, GameEvent::GameCompleted { .. }) {
                    completions += 1;
                }
            }
            // Each match scores exactly one
            assert_eq!(engine.score(), last_score + 1);
            last_score = engine.score();
        }

        assert_eq!(completions, 1);
        assert_eq!(engine.score(), 3);
        assert!(engine.is_completed());

        // Absorbing
        for cell in 0..6 {
            assert!(engine.click(cell).unwrap().is_empty());
        }
    }

    #[test]
    fn test_out_of_range_click() {
        let mut engine = engine();
        assert!(matches!(engine.click(6), Err(GameError::NoSuchCell(6))));
    }
}
