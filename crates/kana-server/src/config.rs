//! Server configuration from the environment.

use anyhow::Context;
use kana_core::PAIR_COUNT;
use std::net::SocketAddr;

const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:1234";
const DEFAULT_WS_ADDR: &str = "0.0.0.0:1235";
const DEFAULT_SCOREBOARD_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Pages, timer and scoreboard API
    pub http_addr: SocketAddr,
    /// Session channel
    pub ws_addr: SocketAddr,
    /// Entries returned by `api/scoreboard`
    pub scoreboard_limit: usize,
    /// Pairs a session must report before it may end
    pub pairs_needed: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 1234)),
            ws_addr: SocketAddr::from(([0, 0, 0, 0], 1235)),
            scoreboard_limit: DEFAULT_SCOREBOARD_LIMIT,
            pairs_needed: PAIR_COUNT,
        }
    }
}

impl ServerConfig {
    /// Read `HTTP_ADDR`, `WS_ADDR` and `SCOREBOARD_LIMIT`
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let http_addr = var("HTTP_ADDR", DEFAULT_HTTP_ADDR)
            .parse()
            .context("Invalid HTTP_ADDR")?;
        let ws_addr = var("WS_ADDR", DEFAULT_WS_ADDR)
            .parse()
            .context("Invalid WS_ADDR")?;
        let scoreboard_limit = var("SCOREBOARD_LIMIT", &DEFAULT_SCOREBOARD_LIMIT.to_string())
            .parse()
            .context("Invalid SCOREBOARD_LIMIT")?;

        Ok(Self {
            http_addr,
            ws_addr,
            scoreboard_limit,
            pairs_needed: PAIR_COUNT,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("HTTP_ADDR", " 127.0.0.1:8080 "),
            ("SCOREBOARD_LIMIT", "25"),
            ("WS_ADDR", ""),
        ]))
        .unwrap();

        assert_eq!(config.http_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.ws_addr, "0.0.0.0:1235".parse().unwrap());
        assert_eq!(config.scoreboard_limit, 25);
    }

    #[test]
    fn test_invalid_value() {
        assert!(ServerConfig::from_lookup(lookup(&[("SCOREBOARD_LIMIT", "many")])).is_err());
        assert!(ServerConfig::from_lookup(lookup(&[("WS_ADDR", "nowhere")])).is_err());
    }
}
