//! Server-side record of one player's game.
//!
//! The client reports `start`, one `pair` per match and `end`. The server
//! only accepts the end of a game once it has seen every pair, each a real
//! dictionary entry, all from the same kana set.

use kana_core::{ClientEvent, Dictionary, DictionaryKind};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Game already started")]
    AlreadyStarted,

    #[error("Game not started")]
    NotStarted,

    #[error("Game already finished")]
    AlreadyFinished,

    #[error("Unknown pair {kana} / {romaji}")]
    UnknownPair { kana: String, romaji: String },

    #[error("Pair {0} reported twice")]
    DuplicatePair(String),

    #[error("Pairs must all come from {0}")]
    MixedDictionaries(DictionaryKind),

    #[error("Only {found} of {needed} pairs found")]
    Incomplete { found: usize, needed: usize },

    #[error("Game ended before it started")]
    EndBeforeStart,
}

/// A confirmed match as reported by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairRecord {
    pub kana: String,
    pub romaji: String,
    pub timestamp: i64,
}

/// What recording an event led to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Recorded,
    /// Game verified complete
    Finished { duration: Duration },
}

/// One connection's game
#[derive(Debug, Clone)]
pub struct GameSession {
    pub id: Uuid,
    pairs_needed: usize,
    start_ms: Option<i64>,
    end_ms: Option<i64>,
    dictionary: Option<DictionaryKind>,
    pairs: Vec<PairRecord>,
    seen: HashSet<String>,
}

impl GameSession {
    pub fn new(id: Uuid, pairs_needed: usize) -> Self {
        Self {
            id,
            pairs_needed,
            start_ms: None,
            end_ms: None,
            dictionary: None,
            pairs: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn is_started(&self) -> bool {
        self.start_ms.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.end_ms.is_some()
    }

    pub fn pairs(&self) -> &[PairRecord] {
        &self.pairs
    }

    pub fn record(&mut self, event: ClientEvent) -> Result<SessionOutcome, SessionError> {
        if self.is_finished() {
            return Err(SessionError::AlreadyFinished);
        }

        match event {
            ClientEvent::Start { timestamp } => {
                if self.is_started() {
                    return Err(SessionError::AlreadyStarted);
                }
                self.start_ms = Some(timestamp);
                Ok(SessionOutcome::Recorded)
            }

            ClientEvent::Pair {
                kana,
                romaji,
                timestamp,
            } => {
                if !self.is_started() {
                    return Err(SessionError::NotStarted);
                }
                let kind = self.check_pair(&kana, &romaji)?;
                if !self.seen.insert(kana.clone()) {
                    return Err(SessionError::DuplicatePair(kana));
                }
                self.dictionary = Some(kind);
                self.pairs.push(PairRecord {
                    kana,
                    romaji,
                    timestamp,
                });
                Ok(SessionOutcome::Recorded)
            }

            ClientEvent::End { timestamp } => {
                let start = self.start_ms.ok_or(SessionError::NotStarted)?;
                if self.pairs.len() < self.pairs_needed {
                    return Err(SessionError::Incomplete {
                        found: self.pairs.len(),
                        needed: self.pairs_needed,
                    });
                }
                let elapsed = timestamp
                    .checked_sub(start)
                    .filter(|ms| *ms >= 0)
                    .ok_or(SessionError::EndBeforeStart)?;
                self.end_ms = Some(timestamp);
                Ok(SessionOutcome::Finished {
                    duration: Duration::from_millis(elapsed as u64),
                })
            }
        }
    }

    /// Which set the pair belongs to, respecting the set already in use
    fn check_pair(&self, kana: &str, romaji: &str) -> Result<DictionaryKind, SessionError> {
        let kind = DictionaryKind::ALL
            .into_iter()
            .find(|kind| Dictionary::builtin(*kind).contains_pair(kana, romaji))
            .ok_or_else(|| SessionError::UnknownPair {
                kana: kana.to_string(),
                romaji: romaji.to_string(),
            })?;

        match self.dictionary {
            Some(current) if current != kind => Err(SessionError::MixedDictionaries(current)),
            _ => Ok(kind),
        }
    }
}
