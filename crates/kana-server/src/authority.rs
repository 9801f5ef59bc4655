//! Time authority: server-side start/stop timestamps keyed by timer id.

use dashmap::DashMap;
use kana_core::{TimerStart, TimerStop};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorityError {
    #[error("Invalid timer id '{0}'")]
    InvalidId(String),

    #[error("Unknown timer {0}")]
    UnknownTimer(Uuid),
}

/// Current unix time in milliseconds
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy)]
struct TimerRecord {
    start_ms: i64,
    stop_ms: Option<i64>,
}

#[derive(Debug, Default)]
pub struct TimerRegistry {
    timers: DashMap<Uuid, TimerRecord>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a timer at `now_ms`
    pub fn start(&self, now_ms: i64) -> TimerStart {
        let id = Uuid::new_v4();
        self.timers.insert(
            id,
            TimerRecord {
                start_ms: now_ms,
                stop_ms: None,
            },
        );
        debug!("Started timer {}", id);
        TimerStart {
            timer_id: id.to_string(),
            start_time: now_ms,
        }
    }

    /// Stop a timer at `now_ms`. The first stop wins; later calls return
    /// the same timestamps.
    pub fn stop(&self, timer_id: &str, now_ms: i64) -> Result<TimerStop, AuthorityError> {
        let id = Uuid::parse_str(timer_id.trim())
            .map_err(|_| AuthorityError::InvalidId(timer_id.to_string()))?;
        let mut record = self
            .timers
            .get_mut(&id)
            .ok_or(AuthorityError::UnknownTimer(id))?;

        let start_ms = record.start_ms;
        let stop_ms = *record.stop_ms.get_or_insert(now_ms.max(start_ms));
        debug!("Stopped timer {}", id);
        Ok(TimerStop {
            start_time: record.start_ms,
            stop_time: stop_ms,
        })
    }
}
