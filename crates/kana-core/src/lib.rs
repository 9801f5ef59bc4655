//! Memory Kana - a kana/romaji pairs game engine
//!
//! This crate provides the core game logic for Memory Kana, including:
//! - The built-in hiragana and katakana dictionaries
//! - Dealing a randomized, duplicate-free deck onto the grid
//! - The two-click reveal/match state machine with score and completion
//! - Local and server-anchored session timing
//! - The session channel wire format and scoreboard rendering
//!
//! # Architecture
//!
//! The engine never touches a DOM, a socket or a clock. The
//! [`GameController`] takes inputs (clicks, ticks, network responses) and
//! returns [`Effect`]s for its host to perform. It can be compiled to:
//! - Native Rust for tests and server-side validation
//! - WebAssembly for the browser client (`wasm` feature)
//!
//! # Modules
//!
//! - [`dictionary`]: Glyph → romaji sets
//! - [`deck`]: Dealing pairs onto slots
//! - [`grid`]: Cells and their visibility
//! - [`engine`]: Two-click match state machine
//! - [`timer`]: Session timing and `MM:SS` formatting
//! - [`channel`]: Session channel messages
//! - [`game`]: Session controller
//! - [`scoreboard`]: Scoreboard records and rows

pub mod actions;
pub mod channel;
pub mod deck;
pub mod dictionary;
pub mod engine;
pub mod game;
pub mod grid;
pub mod scoreboard;
pub mod timer;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::{ConcealToken, Effect, GameEvent};
pub use channel::{ChannelError, ClientEvent, ServerEvent};
pub use deck::{PairDeck, Slot, CELL_COUNT, PAIR_COUNT};
pub use dictionary::{Dictionary, DictionaryKind, KanaPair};
pub use engine::{MatchEngine, MatchState, CONCEAL_DELAY};
pub use game::{ChannelLink, GameConfig, GameController, GameError, SessionSnapshot};
pub use grid::{Cell, CellIndex, Side, TileGrid, Visibility};
pub use scoreboard::{parse_scoreboard, render_rows, render_table, ScoreRecord, ScoreRow};
pub use timer::{
    format_clock, parse_clock, SessionTimer, TimerError, TimerMode, TimerStart, TimerStatus,
    TimerStop, TICK_INTERVAL_MS,
};
