//! Game session controller.
//!
//! `GameController` composes the deck, grid, match engine, timer and session
//! channel. It never performs I/O: every input returns the [`Effect`]s the
//! host must carry out, which keeps the whole session testable without a
//! browser.

use crate::actions::{ConcealToken, Effect, GameEvent};
use crate::channel::{ClientEvent, ServerEvent};
use crate::deck::{PairDeck, CELL_COUNT, PAIR_COUNT};
use crate::dictionary::{Dictionary, DictionaryKind};
use crate::engine::{MatchEngine, CONCEAL_DELAY};
use crate::grid::{Cell, CellIndex, TileGrid, Visibility};
use crate::timer::{
    format_clock, SessionTimer, TimerError, TimerMode, TimerStart, TimerStatus, TimerStop,
    TICK_INTERVAL_MS,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur when setting up or playing a session
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No cell at index {0}")]
    NoSuchCell(CellIndex),

    #[error("Cell {cell} can't go from {from:?} to {to:?}")]
    InvalidTransition {
        cell: CellIndex,
        from: Visibility,
        to: Visibility,
    },
}

/// Session configuration, injected at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    /// Which kana set to deal from
    pub dictionary: DictionaryKind,
    pub pair_count: usize,
    pub cell_count: usize,
    /// How long a flipped pair stays up
    pub conceal_delay_ms: u64,
    pub timer_mode: TimerMode,
    /// Report start/pair/end over a session channel
    pub use_channel: bool,
    /// Anti-forgery token sent with the completion report
    pub csrf_token: Option<String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            dictionary: DictionaryKind::Hiragana,
            pair_count: PAIR_COUNT,
            cell_count: CELL_COUNT,
            conceal_delay_ms: CONCEAL_DELAY.as_millis() as u64,
            timer_mode: TimerMode::Local,
            use_channel: false,
            csrf_token: None,
        }
    }
}

/// Session channel lifecycle as seen by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelLink {
    Disabled,
    Open,
    /// Closed before the server redirected
    Lost,
    Redirected,
}

/// Read-only view of a session for renderers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub cells: Vec<Cell>,
    pub score: u32,
    pub max_score: u32,
    pub completed: bool,
    pub clock: String,
}

/// One game session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameController {
    engine: MatchEngine,
    timer: SessionTimer,
    channel: ChannelLink,
    csrf_token: Option<String>,
    /// Result shown to the player
    finalized: bool,
    /// Score submitted, or handed over to the server's redirect
    reported: bool,
}

impl GameController {
    /// Deal a new session from the configured built-in dictionary
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        Self::with_rng(config, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(config: GameConfig, rng: &mut R) -> Result<Self, GameError> {
        let dictionary = Dictionary::builtin(config.dictionary);
        Self::with_dictionary(config, &dictionary, rng)
    }

    /// Deal from a custom dictionary
    pub fn with_dictionary<R: Rng + ?Sized>(
        config: GameConfig,
        dictionary: &Dictionary,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        let deck = PairDeck::deal(dictionary, config.pair_count, config.cell_count, rng)?;
        info!(
            "Dealt {} pairs from {} onto {} cells",
            deck.pairs().len(),
            dictionary.name(),
            deck.slots().len()
        );
        Ok(Self::from_grid(TileGrid::from_deck(&deck), config))
    }

    /// Start a session on an explicit layout
    pub fn from_grid(grid: TileGrid, config: GameConfig) -> Self {
        Self {
            engine: MatchEngine::with_delay(grid, Duration::from_millis(config.conceal_delay_ms)),
            timer: SessionTimer::new(config.timer_mode),
            channel: if config.use_channel {
                ChannelLink::Open
            } else {
                ChannelLink::Disabled
            },
            csrf_token: config.csrf_token,
            finalized: false,
            reported: false,
        }
    }

    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn channel(&self) -> ChannelLink {
        self.channel
    }

    pub fn score(&self) -> u32 {
        self.engine.score()
    }

    pub fn is_completed(&self) -> bool {
        self.engine.is_completed()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            cells: self.engine.grid().cells().to_vec(),
            score: self.engine.score(),
            max_score: self.engine.max_score(),
            completed: self.engine.is_completed(),
            clock: self.timer.display(),
        }
    }

    /// What the host does right after construction
    pub fn initial_effects(&self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.channel == ChannelLink::Open {
            effects.push(Effect::OpenChannel);
        }
        effects.extend((0..self.engine.grid().len()).map(|cell| Effect::RenderCell {
            cell,
            visibility: Visibility::Hidden,
        }));
        effects.push(Effect::RenderTimer {
            text: self.timer.display(),
        });
        effects
    }

    /// The player clicked `cell` at `now_ms` (unix milliseconds)
    pub fn click(&mut self, cell: CellIndex, now_ms: i64) -> Result<Vec<Effect>, GameError> {
        if self.engine.is_completed() {
            return Ok(Vec::new());
        }

        let events = self.engine.click(cell)?;
        let mut effects = Vec::new();

        if !self.timer.is_started() {
            self.timer.start(now_ms);
            effects.push(Effect::StartTicking {
                interval_ms: TICK_INTERVAL_MS,
            });
            match self.timer.mode() {
                TimerMode::Local => effects.push(Effect::RenderTimer {
                    text: self.timer.display(),
                }),
                TimerMode::ServerAnchored => effects.push(Effect::RequestTimerStart),
            }
            self.send(&mut effects, ClientEvent::Start { timestamp: now_ms });
        }

        self.apply_events(events, now_ms, &mut effects);
        Ok(effects)
    }

    /// A scheduled conceal fired
    pub fn conceal_due(&mut self, token: ConcealToken, now_ms: i64) -> Vec<Effect> {
        let mut effects = Vec::new();
        let events = self.engine.conceal_due(token);
        self.apply_events(events, now_ms, &mut effects);
        effects
    }

    /// Periodic clock tick
    pub fn tick(&mut self, now_ms: i64) -> Vec<Effect> {
        if self.timer.tick(now_ms) {
            vec![Effect::RenderTimer {
                text: self.timer.display(),
            }]
        } else {
            Vec::new()
        }
    }

    /// The time authority answered (or failed) the start request
    pub fn timer_started(
        &mut self,
        result: Result<TimerStart, TimerError>,
        now_ms: i64,
    ) -> Vec<Effect> {
        if self.timer.status() != TimerStatus::Pending {
            debug!("Ignoring time authority start response in {:?}", self.timer.status());
            return Vec::new();
        }

        match result {
            Ok(start) => self.timer.anchor(start, now_ms),
            Err(e) => self.timer.degrade(&e, now_ms),
        }
        vec![Effect::RenderTimer {
            text: self.timer.display(),
        }]
    }

    /// The time authority answered (or failed) the stop request
    pub fn timer_stopped(&mut self, result: Result<TimerStop, TimerError>) -> Vec<Effect> {
        if self.finalized {
            return Vec::new();
        }
        match result {
            Ok(stop) => self.timer.finalize(&stop),
            Err(e) => warn!("Using local elapsed time: {}", e),
        }
        let mut effects = Vec::new();
        self.finalize(&mut effects);
        effects
    }

    /// A message arrived on the session channel
    pub fn channel_message(&mut self, text: &str) -> Vec<Effect> {
        if matches!(self.channel, ChannelLink::Disabled | ChannelLink::Redirected) {
            return Vec::new();
        }

        match ServerEvent::decode(text) {
            Ok(ServerEvent::GameOver { redirect }) => {
                info!("Server confirmed completion, redirecting to {}", redirect);
                self.channel = ChannelLink::Redirected;
                self.reported = true;
                vec![Effect::Navigate { location: redirect }]
            }
            Ok(ServerEvent::Error { message }) => {
                warn!("Server rejected session event: {}", message);
                let mut effects = vec![Effect::ShowAnomaly { message }];
                // A finished game the server refused will never be redirected.
                if self.finalized && !self.reported {
                    self.submit(&mut effects);
                }
                effects
            }
            Err(e) => {
                warn!("Ignoring session channel message: {}", e);
                Vec::new()
            }
        }
    }

    /// The session channel closed
    pub fn channel_closed(&mut self) -> Vec<Effect> {
        if self.channel != ChannelLink::Open {
            return Vec::new();
        }
        warn!("Session channel closed before the server redirected");
        self.channel = ChannelLink::Lost;

        let mut effects = vec![Effect::ShowAnomaly {
            message: "Lost connection to the game server".to_string(),
        }];
        // The redirect will never come; fall back to the completion report.
        if self.finalized && !self.reported {
            self.submit(&mut effects);
        }
        effects
    }

    fn apply_events(&mut self, events: Vec<GameEvent>, now_ms: i64, effects: &mut Vec<Effect>) {
        for event in events {
            match event {
                GameEvent::CellRevealed { cell } => effects.push(Effect::RenderCell {
                    cell,
                    visibility: Visibility::Selected,
                }),
                GameEvent::Mismatch { first, second } => {
                    debug!("Cells {} and {} don't match", first, second);
                }
                GameEvent::PairMatched {
                    first,
                    second,
                    glyph,
                    romaji,
                    score,
                } => {
                    debug!("Matched {} / {} (score {})", glyph, romaji, score);
                    for cell in [first, second] {
                        effects.push(Effect::RenderCell {
                            cell,
                            visibility: Visibility::Matched,
                        });
                    }
                    self.send(
                        effects,
                        ClientEvent::Pair {
                            kana: glyph,
                            romaji,
                            timestamp: now_ms,
                        },
                    );
                }
                GameEvent::ConcealScheduled {
                    token, delay_ms, ..
                } => effects.push(Effect::ScheduleConceal { token, delay_ms }),
                GameEvent::CellsConcealed { cells } => {
                    effects.extend(cells.into_iter().map(|cell| Effect::RenderCell {
                        cell,
                        visibility: Visibility::Hidden,
                    }));
                }
                GameEvent::GameCompleted { score } => {
                    info!("All {} pairs found", score);
                    self.complete(now_ms, effects);
                }
            }
        }
    }

    fn complete(&mut self, now_ms: i64, effects: &mut Vec<Effect>) {
        if self.timer.status() == TimerStatus::Pending {
            // No anchor will arrive in time; keep the locally counted time.
            self.timer.tick(now_ms);
            self.timer.degrade(
                &TimerError::Network("no start response before completion".to_string()),
                now_ms,
            );
        }
        self.timer.stop();
        effects.push(Effect::StopTicking);
        self.send(effects, ClientEvent::End { timestamp: now_ms });

        let stop_request = match self.timer.mode() {
            TimerMode::ServerAnchored => self.timer.timer_id().map(str::to_string),
            TimerMode::Local => None,
        };
        match stop_request {
            Some(timer_id) => effects.push(Effect::RequestTimerStop { timer_id }),
            None => self.finalize(effects),
        }
    }

    fn finalize(&mut self, effects: &mut Vec<Effect>) {
        if self.finalized {
            return;
        }
        self.finalized = true;

        let elapsed = format_clock(self.timer.final_elapsed_ms() / 1000);
        effects.push(Effect::RenderTimer {
            text: elapsed.clone(),
        });
        effects.push(Effect::ShowResult {
            score: self.engine.score(),
            elapsed,
        });

        // With a live channel the server reports the score and redirects.
        if self.channel != ChannelLink::Open {
            self.submit(effects);
        }
    }

    fn submit(&mut self, effects: &mut Vec<Effect>) {
        if self.reported {
            return;
        }
        self.reported = true;
        effects.push(Effect::SubmitScore {
            player_time: format_clock(self.timer.final_elapsed_ms() / 1000),
            csrf_token: self.csrf_token.clone(),
        });
    }

    fn send(&self, effects: &mut Vec<Effect>, event: ClientEvent) {
        if self.channel == ChannelLink::Open {
            effects.push(Effect::Send { event });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Side;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn two_pair_grid() -> TileGrid {
        TileGrid::from_cells(vec![
            Cell::new("あ", "a", Side::Glyph),
            Cell::new("i", "い", Side::Romaji),
            Cell::new("a", "あ", Side::Romaji),
            Cell::new("い", "i", Side::Glyph),
        ])
    }

    #[test]
    fn test_new_game_deals_full_grid() {
        let mut rng = StdRng::seed_from_u64(3);
        let game = GameController::with_rng(GameConfig::default(), &mut rng).unwrap();

        assert_eq!(game.engine().grid().len(), 24);
        assert_eq!(game.engine().max_score(), 12);
        assert_eq!(game.score(), 0);
        assert!(!game.timer().is_started());
    }

    #[test]
    fn test_bad_config_builds_nothing() {
        let config = GameConfig {
            cell_count: 20,
            ..GameConfig::default()
        };
        assert!(matches!(
            GameController::new(config),
            Err(GameError::Configuration(_))
        ));
    }

    #[test]
    fn test_config_from_json_uses_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{"dictionary":"katakana","timerMode":"serverAnchored"}"#)
                .unwrap();
        assert_eq!(config.dictionary, DictionaryKind::Katakana);
        assert_eq!(config.timer_mode, TimerMode::ServerAnchored);
        assert_eq!(config.pair_count, 12);
        assert_eq!(config.conceal_delay_ms, 200);
    }

    #[test]
    fn test_first_click_starts_local_timer() {
        let mut game = GameController::from_grid(two_pair_grid(), GameConfig::default());
        let effects = game.click(0, 1_000).unwrap();

        assert!(effects.contains(&Effect::StartTicking { interval_ms: 1000 }));
        assert!(effects.contains(&Effect::RenderCell {
            cell: 0,
            visibility: Visibility::Selected
        }));
        assert!(game.timer().is_started());

        // Second click doesn't restart anything
        let effects = game.click(1, 1_100).unwrap();
        assert!(!effects
            .iter()
            .any(|e| matches!(e, Effect::StartTicking { .. })));
    }

    #[test]
    fn test_local_completion_submits_score() {
        let config = GameConfig {
            csrf_token: Some("token-1".to_string()),
            ..GameConfig::default()
        };
        let mut game = GameController::from_grid(two_pair_grid(), config);

        game.click(0, 0).unwrap();
        let effects = game.click(2, 100).unwrap();
        for effect in effects {
            if let Effect::ScheduleConceal { token, .. } = effect {
                game.conceal_due(token, 300);
            }
        }
        for now in [1_000, 2_000, 3_000] {
            game.tick(now);
        }

        game.click(1, 3_100).unwrap();
        let effects = game.click(3, 3_200).unwrap();

        assert!(effects.contains(&Effect::StopTicking));
        assert!(effects.contains(&Effect::ShowResult {
            score: 2,
            elapsed: "00:03".to_string()
        }));
        assert!(effects.contains(&Effect::SubmitScore {
            player_time: "00:03".to_string(),
            csrf_token: Some("token-1".to_string()),
        }));
        assert!(game.is_completed());
        assert!(game.tick(4_000).is_empty());
    }
}
