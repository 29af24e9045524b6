//! Dispatcher configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default worker thread name.
const DEFAULT_THREAD_NAME: &str = "huesync-dispatch";
/// Calls slower than this are logged as slow (roughly two 60 Hz frames).
const DEFAULT_SLOW_CALL_MS: u64 = 33;

const ENV_SLOW_CALL_MS: &str = "HUESYNC_SLOW_CALL_MS";
const ENV_SYNC_ON_START: &str = "HUESYNC_SYNC_ON_START";

/// Runtime configuration for a [`FilterDispatcher`](crate::FilterDispatcher).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Name given to the dispatch worker thread.
    pub thread_name: String,
    /// Native calls taking longer than this many milliseconds are reported
    /// as slow. The call itself is never interrupted.
    pub slow_call_ms: u64,
    /// Dispatch the store's initial triple once at startup instead of
    /// assuming the renderer already starts from it.
    pub sync_on_start: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            slow_call_ms: std::env::var(ENV_SLOW_CALL_MS)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SLOW_CALL_MS),
            sync_on_start: std::env::var(ENV_SYNC_ON_START)
                .ok()
                .and_then(|s| parse_flag(&s))
                .unwrap_or(false),
        }
    }
}

impl DispatcherConfig {
    /// Like `default()`, but malformed environment values are errors
    /// instead of being silently replaced.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self {
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            slow_call_ms: DEFAULT_SLOW_CALL_MS,
            sync_on_start: false,
        };
        if let Ok(value) = std::env::var(ENV_SLOW_CALL_MS) {
            config.slow_call_ms = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                key: ENV_SLOW_CALL_MS,
                value: value.clone(),
            })?;
        }
        if let Ok(value) = std::env::var(ENV_SYNC_ON_START) {
            config.sync_on_start = parse_flag(&value).ok_or(ConfigError::InvalidEnv {
                key: ENV_SYNC_ON_START,
                value,
            })?;
        }
        Ok(config)
    }

    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn slow_call_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_call_ms)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_fills_defaults() {
        let config = DispatcherConfig::from_json(r#"{ "sync_on_start": true }"#).unwrap();
        assert!(config.sync_on_start);
        assert_eq!(config.thread_name, DEFAULT_THREAD_NAME);
    }

    #[test]
    fn test_from_json_rejects_wrong_types() {
        let err = DispatcherConfig::from_json(r#"{ "slow_call_ms": "fast" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_slow_call_threshold() {
        let config = DispatcherConfig {
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            slow_call_ms: 250,
            sync_on_start: false,
        };
        assert_eq!(config.slow_call_threshold(), Duration::from_millis(250));
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
