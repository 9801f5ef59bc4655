//! Scoreboard storage.
//!
//! Finished games are stored as a generated guest name and the elapsed time.
//! Durable storage is an external concern; [`MemoryStore`] keeps everything
//! in process.

use dashmap::DashMap;
use kana_core::ScoreRecord;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::time::Duration;
use thiserror::Error;

/// Length of the random part of a guest name
const GUEST_SUFFIX_LEN: usize = 8;

/// Attempts at finding an unused guest name
const NAME_ATTEMPTS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Player {0} not found")]
    UnknownPlayer(String),

    #[error("Could not allocate a unique player name")]
    NamesExhausted,
}

/// One finished game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerTime {
    pub player: String,
    pub elapsed: Duration,
}

impl PlayerTime {
    /// As an `api/scoreboard` record; the score is the elapsed whole seconds
    pub fn to_record(&self) -> ScoreRecord {
        ScoreRecord::new(self.player.clone(), self.elapsed.as_secs())
    }
}

pub trait ScoreStore: Send + Sync {
    /// Store a finished game under a fresh guest name and return the name
    fn insert(&self, elapsed: Duration) -> Result<String, StoreError>;

    /// Fastest games first
    fn top(&self, limit: usize) -> Vec<PlayerTime>;

    /// A player's time and 1-based rank among all games
    fn rank(&self, player: &str) -> Result<(PlayerTime, usize), StoreError>;
}

/// `guest-` followed by random letters and digits
pub fn guest_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let suffix: String = (0..GUEST_SUFFIX_LEN)
        .map(|_| rng.sample(Alphanumeric) as char)
        .collect();
    format!("guest-{}", suffix)
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    times: DashMap<String, Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(&self) -> Vec<PlayerTime> {
        let mut times: Vec<PlayerTime> = self
            .times
            .iter()
            .map(|entry| PlayerTime {
                player: entry.key().clone(),
                elapsed: *entry.value(),
            })
            .collect();
        times.sort_by(|a, b| a.elapsed.cmp(&b.elapsed).then_with(|| a.player.cmp(&b.player)));
        times
    }
}

impl ScoreStore for MemoryStore {
    fn insert(&self, elapsed: Duration) -> Result<String, StoreError> {
        let mut rng = rand::thread_rng();
        for _ in 0..NAME_ATTEMPTS {
            let name = guest_name(&mut rng);
            if let dashmap::mapref::entry::Entry::Vacant(slot) = self.times.entry(name.clone()) {
                slot.insert(elapsed);
                return Ok(name);
            }
        }
        Err(StoreError::NamesExhausted)
    }

    fn top(&self, limit: usize) -> Vec<PlayerTime> {
        let mut times = self.sorted();
        times.truncate(limit);
        times
    }

    fn rank(&self, player: &str) -> Result<(PlayerTime, usize), StoreError> {
        let elapsed = self
            .times
            .get(player)
            .map(|entry| *entry.value())
            .ok_or_else(|| StoreError::UnknownPlayer(player.to_string()))?;

        let rank = self.times.iter().filter(|e| *e.value() <= elapsed).count();
        Ok((
            PlayerTime {
                player: player.to_string(),
                elapsed,
            },
            rank,
        ))
    }
}
