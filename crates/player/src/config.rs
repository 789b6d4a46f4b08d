//! Player configuration loaded from the environment.
//!
//! | variable | default |
//! |---|---|
//! | `ARGONVALE_WS_URL` | `ws://localhost:8000/ws` |
//! | `ARGONVALE_API_URL` | `http://localhost:8000` |
//! | `ARGONVALE_TOKEN` | unset |
//! | `ARGONVALE_PLAYER_ID` | unset |
//! | `ARGONVALE_RECONNECT_MS` | `3000` |
//! | `ARGONVALE_RECONNECT_MULTIPLIER` | `1.0` |
//! | `ARGONVALE_RECONNECT_MAX_MS` | `30000` |
//! | `ARGONVALE_MOVE_INTERVAL_MS` | `150` |
//! | `ARGONVALE_MAPS_DIR` | unset (maps are fetched over HTTP) |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use argonvale_shared::PlayerId;
use thiserror::Error;
use url::Url;

use crate::infrastructure::websocket::ReconnectPolicy;

pub const DEFAULT_WS_URL: &str = "ws://localhost:8000/ws";
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_RECONNECT_MS: u64 = 3_000;
pub const DEFAULT_RECONNECT_MAX_MS: u64 = 30_000;
pub const DEFAULT_MOVE_INTERVAL_MS: u64 = 150;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} is not a valid URL: {source}")]
    InvalidUrl {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("ARGONVALE_RECONNECT_MULTIPLIER must be at least 1.0, got {0}")]
    MultiplierTooSmall(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    pub ws_url: Url,
    pub api_url: Url,
    pub token: Option<String>,
    pub player_id: Option<PlayerId>,
    pub reconnect: ReconnectPolicy,
    pub move_interval: Duration,
    pub maps_dir: Option<PathBuf>,
}

impl PlayerConfig {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary lookup (used by tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let ws_url = parse_url("ARGONVALE_WS_URL", get("ARGONVALE_WS_URL"), DEFAULT_WS_URL)?;
        let api_url = parse_url("ARGONVALE_API_URL", get("ARGONVALE_API_URL"), DEFAULT_API_URL)?;

        let player_id = get("ARGONVALE_PLAYER_ID")
            .map(|v| parse_number::<i64>("ARGONVALE_PLAYER_ID", v))
            .transpose()?
            .map(PlayerId::new);

        let initial_ms = parse_or(
            "ARGONVALE_RECONNECT_MS",
            get("ARGONVALE_RECONNECT_MS"),
            DEFAULT_RECONNECT_MS,
        )?;
        let max_ms = parse_or(
            "ARGONVALE_RECONNECT_MAX_MS",
            get("ARGONVALE_RECONNECT_MAX_MS"),
            DEFAULT_RECONNECT_MAX_MS,
        )?;
        let multiplier = parse_or(
            "ARGONVALE_RECONNECT_MULTIPLIER",
            get("ARGONVALE_RECONNECT_MULTIPLIER"),
            1.0_f64,
        )?;
        if multiplier < 1.0 || multiplier.is_nan() {
            return Err(ConfigError::MultiplierTooSmall(multiplier));
        }
        let move_interval_ms = parse_or(
            "ARGONVALE_MOVE_INTERVAL_MS",
            get("ARGONVALE_MOVE_INTERVAL_MS"),
            DEFAULT_MOVE_INTERVAL_MS,
        )?;

        Ok(Self {
            ws_url,
            api_url,
            token: get("ARGONVALE_TOKEN"),
            player_id,
            reconnect: ReconnectPolicy {
                initial_delay: Duration::from_millis(initial_ms),
                multiplier,
                max_delay: Duration::from_millis(max_ms.max(initial_ms)),
            },
            move_interval: Duration::from_millis(move_interval_ms),
            maps_dir: get("ARGONVALE_MAPS_DIR").map(PathBuf::from),
        })
    }
}

fn parse_url(var: &'static str, value: Option<String>, default: &str) -> Result<Url, ConfigError> {
    let raw = value.as_deref().unwrap_or(default);
    Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { var, source })
}

fn parse_number<T: FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidNumber { var, value })
}

fn parse_or<T: FromStr>(var: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        Some(v) => parse_number(var, v),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_observed_client() {
        let config = PlayerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.ws_url.as_str(), DEFAULT_WS_URL);
        assert_eq!(config.reconnect.initial_delay, Duration::from_secs(3));
        assert_eq!(config.reconnect.multiplier, 1.0);
        assert_eq!(config.move_interval, Duration::from_millis(150));
        assert!(config.token.is_none());
        assert!(config.player_id.is_none());
        assert!(config.maps_dir.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = PlayerConfig::from_lookup(lookup(&[
            ("ARGONVALE_WS_URL", "wss://play.example.com/ws"),
            ("ARGONVALE_TOKEN", "abc"),
            ("ARGONVALE_PLAYER_ID", "42"),
            ("ARGONVALE_RECONNECT_MS", "500"),
            ("ARGONVALE_RECONNECT_MULTIPLIER", "2"),
            ("ARGONVALE_MAPS_DIR", "/srv/maps"),
        ]))
        .unwrap();
        assert_eq!(config.ws_url.host_str(), Some("play.example.com"));
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.player_id, Some(PlayerId::new(42)));
        assert_eq!(config.reconnect.initial_delay, Duration::from_millis(500));
        assert_eq!(config.reconnect.multiplier, 2.0);
        assert_eq!(config.maps_dir, Some(PathBuf::from("/srv/maps")));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = PlayerConfig::from_lookup(lookup(&[("ARGONVALE_TOKEN", "  ")])).unwrap();
        assert!(config.token.is_none());
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = PlayerConfig::from_lookup(lookup(&[("ARGONVALE_MOVE_INTERVAL_MS", "fast")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidNumber { var: "ARGONVALE_MOVE_INTERVAL_MS", .. }
        ));
    }

    #[test]
    fn rejects_shrinking_multiplier() {
        let err = PlayerConfig::from_lookup(lookup(&[("ARGONVALE_RECONNECT_MULTIPLIER", "0.5")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MultiplierTooSmall(_)));
    }
}
