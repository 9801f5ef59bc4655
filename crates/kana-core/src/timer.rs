//! Session timing.
//!
//! The timer is driven entirely from outside: the host calls [`SessionTimer::tick`]
//! with the current wall-clock time in milliseconds. In local mode every tick
//! counts as one second. In server-anchored mode elapsed time is the
//! measured request latency plus wall-clock progress since the start response,
//! and the authoritative result comes from the time authority's stop response.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Interval between ticks, in milliseconds
pub const TICK_INTERVAL_MS: u64 = 1000;

/// Who decides how long a game took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerMode {
    /// Count one-second ticks locally
    Local,
    /// Ask the time authority for start and stop timestamps
    ServerAnchored,
}

/// Where the timer is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerStatus {
    NotStarted,
    /// Start requested from the time authority, no answer yet
    Pending,
    Running,
    Stopped,
}

/// `GET timer?action=start` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerStart {
    #[serde(rename = "timerID")]
    pub timer_id: String,
    #[serde(rename = "startTime")]
    pub start_time: i64,
}

/// `GET timer?action=stop` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerStop {
    #[serde(rename = "startTime")]
    pub start_time: i64,
    #[serde(rename = "stopTime")]
    pub stop_time: i64,
}

impl TimerStop {
    /// Authoritative duration in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.stop_time.saturating_sub(self.start_time).max(0) as u64
    }
}

/// Failures talking to the time authority
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("time authority unreachable: {0}")]
    Network(String),

    #[error("malformed time authority response: {0}")]
    Malformed(String),
}

impl TimerStart {
    /// Parse a response body; missing fields count as a failed request
    pub fn parse(body: &str) -> Result<Self, TimerError> {
        serde_json::from_str(body).map_err(|e| TimerError::Malformed(e.to_string()))
    }
}

impl TimerStop {
    /// Parse a response body; missing fields count as a failed request
    pub fn parse(body: &str) -> Result<Self, TimerError> {
        serde_json::from_str(body).map_err(|e| TimerError::Malformed(e.to_string()))
    }
}

/// Elapsed-time tracking for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTimer {
    mode: TimerMode,
    status: TimerStatus,
    elapsed_ms: u64,
    last_tick_ms: Option<i64>,
    timer_id: Option<String>,
    authoritative_ms: Option<u64>,
    degraded: bool,
}

impl SessionTimer {
    pub fn new(mode: TimerMode) -> Self {
        Self {
            mode,
            status: TimerStatus::NotStarted,
            elapsed_ms: 0,
            last_tick_ms: None,
            timer_id: None,
            authoritative_ms: None,
            degraded: false,
        }
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn is_started(&self) -> bool {
        self.status != TimerStatus::NotStarted
    }

    /// Whether the time authority failed and the timer fell back to local mode
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn timer_id(&self) -> Option<&str> {
        self.timer_id.as_deref()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Authoritative duration when the authority answered, local otherwise
    pub fn final_elapsed_ms(&self) -> u64 {
        self.authoritative_ms.unwrap_or(self.elapsed_ms)
    }

    /// First click. Local timers start running; anchored timers count from
    /// the local clock while waiting for [`SessionTimer::anchor`].
    pub fn start(&mut self, now_ms: i64) {
        if self.status != TimerStatus::NotStarted {
            return;
        }
        self.status = match self.mode {
            TimerMode::Local => TimerStatus::Running,
            TimerMode::ServerAnchored => TimerStatus::Pending,
        };
        self.last_tick_ms = Some(now_ms);
    }

    /// The time authority answered the start request
    pub fn anchor(&mut self, start: TimerStart, now_ms: i64) {
        if self.status != TimerStatus::Pending {
            return;
        }
        let latency = now_ms.saturating_sub(start.start_time).max(0) as u64;
        self.elapsed_ms = self.elapsed_ms.max(latency);
        self.last_tick_ms = Some(self.last_tick_ms.map_or(now_ms, |t| t.max(now_ms)));
        self.timer_id = Some(start.timer_id);
        self.status = TimerStatus::Running;
    }

    /// The time authority could not be reached; count locally from here on
    pub fn degrade(&mut self, error: &TimerError, now_ms: i64) {
        warn!("Falling back to local timing: {}", error);
        self.mode = TimerMode::Local;
        self.degraded = true;
        self.timer_id = None;
        if self.status == TimerStatus::Pending {
            self.status = TimerStatus::Running;
            self.last_tick_ms.get_or_insert(now_ms);
        }
    }

    /// Periodic tick. Returns true when the display changed.
    pub fn tick(&mut self, now_ms: i64) -> bool {
        if !matches!(self.status, TimerStatus::Running | TimerStatus::Pending) {
            return false;
        }
        let before = self.elapsed_ms / 1000;
        match self.mode {
            TimerMode::Local => self.elapsed_ms += TICK_INTERVAL_MS,
            TimerMode::ServerAnchored => {
                let prev = self.last_tick_ms.unwrap_or(now_ms);
                if now_ms > prev {
                    self.elapsed_ms += (now_ms - prev) as u64;
                }
            }
        }
        self.last_tick_ms = Some(self.last_tick_ms.map_or(now_ms, |t| t.max(now_ms)));
        self.elapsed_ms / 1000 != before
    }

    /// Stop counting. Later ticks are ignored.
    pub fn stop(&mut self) {
        self.status = TimerStatus::Stopped;
    }

    /// The time authority answered the stop request
    pub fn finalize(&mut self, stop: &TimerStop) {
        self.authoritative_ms = Some(stop.elapsed_ms());
    }

    /// `MM:SS` for the current elapsed time
    pub fn display(&self) -> String {
        format_clock(self.elapsed_ms / 1000)
    }
}

/// Format seconds as `MM:SS`. Minutes are not capped.
pub fn format_clock(total_seconds: u64) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Parse `MM:SS` back into seconds
pub fn parse_clock(text: &str) -> Option<u64> {
    let (minutes, seconds) = text.trim().split_once(':')?;
    if minutes.is_empty() || seconds.len() != 2 {
        return None;
    }
    let minutes: u64 = minutes.parse().ok()?;
    let seconds: u64 = seconds.parse().ok()?;
    if seconds >= 60 {
        return None;
    }
    Some(minutes * 60 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(9), "00:09");
        assert_eq!(format_clock(61), "01:01");
        assert_eq!(format_clock(60 * 75 + 3), "75:03");
    }

    #[test]
    fn test_parse_clock() {
        assert_eq!(parse_clock("01:05"), Some(65));
        assert_eq!(parse_clock("120:00"), Some(7200));
        assert_eq!(parse_clock("1:5"), None);
        assert_eq!(parse_clock("00:60"), None);
        assert_eq!(parse_clock("abc"), None);
    }

    #[test]
    fn test_local_timer_counts_ticks() {
        let mut timer = SessionTimer::new(TimerMode::Local);
        assert!(!timer.tick(0));

        timer.start(0);
        assert!(timer.tick(1_000));
        assert!(timer.tick(2_000));
        assert_eq!(timer.display(), "00:02");

        timer.stop();
        assert!(!timer.tick(3_000));
        assert_eq!(timer.final_elapsed_ms(), 2_000);
    }

    #[test]
    fn test_anchored_timer_includes_latency() {
        let mut timer = SessionTimer::new(TimerMode::ServerAnchored);
        timer.start(10_000);
        assert_eq!(timer.status(), TimerStatus::Pending);

        // Counted locally until the anchor arrives
        assert!(!timer.tick(10_500));
        assert_eq!(timer.elapsed_ms(), 500);

        timer.anchor(
            TimerStart {
                timer_id: "t-1".to_string(),
                start_time: 10_000,
            },
            11_200,
        );
        assert_eq!(timer.elapsed_ms(), 1_200);
        assert_eq!(timer.timer_id(), Some("t-1"));

        timer.tick(12_200);
        assert_eq!(timer.display(), "00:02");

        // Clock going backwards never decreases elapsed time
        timer.tick(11_000);
        assert_eq!(timer.elapsed_ms(), 2_200);

        timer.stop();
        timer.finalize(&TimerStop {
            start_time: 10_000,
            stop_time: 14_000,
        });
        assert_eq!(timer.final_elapsed_ms(), 4_000);
    }

    #[test]
    fn test_degrade_switches_to_local() {
        let mut timer = SessionTimer::new(TimerMode::ServerAnchored);
        timer.start(0);
        timer.degrade(&TimerError::Network("offline".to_string()), 500);

        assert!(timer.is_degraded());
        assert_eq!(timer.mode(), TimerMode::Local);
        assert_eq!(timer.status(), TimerStatus::Running);
        timer.tick(1_500);
        assert_eq!(timer.display(), "00:01");
    }

    #[test]
    fn test_pending_timer_keeps_counting() {
        let mut timer = SessionTimer::new(TimerMode::ServerAnchored);
        timer.start(0);
        for second in 1..=75 {
            timer.tick(second * 1_000);
        }
        assert_eq!(timer.status(), TimerStatus::Pending);
        assert_eq!(timer.display(), "01:15");

        timer.degrade(&TimerError::Network("no answer".to_string()), 75_400);
        timer.stop();
        assert_eq!(timer.final_elapsed_ms(), 75_000);
    }

    #[test]
    fn test_malformed_responses() {
        assert!(matches!(
            TimerStart::parse(r#"{"startTime": 5}"#),
            Err(TimerError::Malformed(_))
        ));
        assert_eq!(
            TimerStop::parse(r#"{"startTime": 5, "stopTime": 65005}"#)
                .unwrap()
                .elapsed_ms(),
            65_000
        );
    }
}
