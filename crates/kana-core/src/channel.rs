//! Session channel messages.
//!
//! Client → server: `{"type": "start" | "pair" | "end", "data": {..., "timestamp"}}`.
//! Server → client: `{"type": "gameover", "data": {"redirect": "/scoreboard?p=..."}}`
//! or `{"type": "error", "data": {"message": "..."}}`. Timestamps are unix
//! milliseconds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Events the client reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ClientEvent {
    /// First click
    Start { timestamp: i64 },

    /// A confirmed match
    Pair {
        kana: String,
        romaji: String,
        timestamp: i64,
    },

    /// Score reached the maximum
    End { timestamp: i64 },
}

impl ClientEvent {
    pub fn timestamp(&self) -> i64 {
        match self {
            ClientEvent::Start { timestamp }
            | ClientEvent::Pair { timestamp, .. }
            | ClientEvent::End { timestamp } => *timestamp,
        }
    }

    pub fn encode(&self) -> Result<String, ChannelError> {
        serde_json::to_string(self).map_err(|e| ChannelError::Encode(e.to_string()))
    }

    pub fn decode(text: &str) -> Result<Self, ChannelError> {
        serde_json::from_str(text).map_err(|e| ChannelError::Malformed(e.to_string()))
    }
}

/// Messages the server pushes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// The server confirmed completion; navigate to `redirect`
    GameOver { redirect: String },

    /// The server rejected an event
    Error { message: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    data: serde_json::Value,
}

impl ServerEvent {
    pub fn encode(&self) -> Result<String, ChannelError> {
        let envelope = match self {
            ServerEvent::GameOver { redirect } => Envelope {
                kind: Some("gameover".to_string()),
                data: serde_json::json!({ "redirect": redirect }),
            },
            ServerEvent::Error { message } => Envelope {
                kind: Some("error".to_string()),
                data: serde_json::json!({ "message": message }),
            },
        };
        serde_json::to_string(&envelope).map_err(|e| ChannelError::Encode(e.to_string()))
    }

    /// Decode a pushed message. Any envelope whose data carries a
    /// `redirect` string is a redirect, whatever its type says.
    pub fn decode(text: &str) -> Result<Self, ChannelError> {
        let envelope: Envelope =
            serde_json::from_str(text).map_err(|e| ChannelError::Malformed(e.to_string()))?;

        if let Some(redirect) = envelope.data.get("redirect").and_then(|v| v.as_str()) {
            return Ok(ServerEvent::GameOver {
                redirect: redirect.to_string(),
            });
        }

        match envelope.kind.as_deref() {
            Some("error") => {
                let message = envelope
                    .data
                    .get("message")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown error")
                    .to_string();
                Ok(ServerEvent::Error { message })
            }
            Some("gameover") | None => {
                Err(ChannelError::Malformed("missing redirect".to_string()))
            }
            Some(other) => Err(ChannelError::UnknownType(other.to_string())),
        }
    }
}

/// Session channel failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("unknown message type '{0}'")]
    UnknownType(String),

    #[error("failed to encode message: {0}")]
    Encode(String),
}
