//! Engine configuration loaded from environment variables.
//!
//! All settings have defaults so an engine can be built with zero
//! configuration.

use murmur_shared::constants::{
    DEFAULT_EVENT_BUFFER, SEND_TIMEOUT_MS, TYPING_SWEEP_INTERVAL_MS, TYPING_THROTTLE_MS,
    TYPING_TTL_MS,
};

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Age after which a typing entry is purged.
    /// Env: `MURMUR_TYPING_TTL_MS`
    /// Default: `5000`
    pub typing_ttl_ms: u64,

    /// Period of the typing sweep and the send timeout check.
    /// Env: `MURMUR_TYPING_SWEEP_MS`
    /// Default: `1000`
    pub sweep_interval_ms: u64,

    /// Minimum gap between outbound typing signals per compose session.
    /// Env: `MURMUR_TYPING_THROTTLE_MS`
    /// Default: `3000`
    pub typing_throttle_ms: u64,

    /// A send still pending after this long is marked failed (0 = never).
    /// Env: `MURMUR_SEND_TIMEOUT_MS`
    /// Default: `60000`
    pub send_timeout_ms: u64,

    /// Whether selecting a channel also marks it read.
    /// Env: `MURMUR_MARK_READ_ON_SELECT` (true/false)
    /// Default: `true`
    pub mark_read_on_select: bool,

    /// Capacity of the bridge's input, outbound and snapshot channels.
    /// Env: `MURMUR_EVENT_BUFFER`
    /// Default: `256`
    pub event_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            typing_ttl_ms: TYPING_TTL_MS,
            sweep_interval_ms: TYPING_SWEEP_INTERVAL_MS,
            typing_throttle_ms: TYPING_THROTTLE_MS,
            send_timeout_ms: SEND_TIMEOUT_MS,
            mark_read_on_select: true,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(ms) = parse_u64(&lookup, "MURMUR_TYPING_TTL_MS") {
            config.typing_ttl_ms = ms;
        }

        if let Some(ms) = parse_u64(&lookup, "MURMUR_TYPING_SWEEP_MS") {
            if ms == 0 {
                tracing::warn!("MURMUR_TYPING_SWEEP_MS must be positive, using default");
            } else {
                config.sweep_interval_ms = ms;
            }
        }

        if let Some(ms) = parse_u64(&lookup, "MURMUR_TYPING_THROTTLE_MS") {
            config.typing_throttle_ms = ms;
        }

        if let Some(ms) = parse_u64(&lookup, "MURMUR_SEND_TIMEOUT_MS") {
            config.send_timeout_ms = ms;
        }

        if let Some(val) = lookup("MURMUR_MARK_READ_ON_SELECT") {
            config.mark_read_on_select = val != "false" && val != "0";
        }

        if let Some(n) = parse_u64(&lookup, "MURMUR_EVENT_BUFFER") {
            if n == 0 {
                tracing::warn!("MURMUR_EVENT_BUFFER must be positive, using default");
            } else {
                config.event_buffer = n as usize;
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let value = lookup(key)?;
    match value.trim().parse::<u64>() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!(key, value = %value, "Invalid numeric setting, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.typing_ttl_ms, 5_000);
        assert_eq!(config.sweep_interval_ms, 1_000);
        assert_eq!(config.typing_throttle_ms, 3_000);
        assert!(config.mark_read_on_select);
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("MURMUR_TYPING_TTL_MS", "2000"),
            ("MURMUR_SEND_TIMEOUT_MS", "0"),
            ("MURMUR_MARK_READ_ON_SELECT", "false"),
        ]));
        assert_eq!(config.typing_ttl_ms, 2_000);
        assert_eq!(config.send_timeout_ms, 0);
        assert!(!config.mark_read_on_select);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("MURMUR_TYPING_TTL_MS", "soon"),
            ("MURMUR_TYPING_SWEEP_MS", "0"),
            ("MURMUR_EVENT_BUFFER", "0"),
        ]));
        assert_eq!(config, EngineConfig::default());
    }
}
