//! Configuration loading and resolution.

use std::time::Duration;

use crate::types::{SERVER_NAME, SERVER_VERSION};

const DEFAULT_DRAIN_TIMEOUT_SECS: u64 = 5;

/// Server identity and connection-level settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Name reported in `serverInfo`.
    pub name: String,
    /// Version reported in `serverInfo`.
    pub version: String,
    /// Free-text usage hints returned from `initialize`.
    pub instructions: Option<String>,
    /// How long the transport waits for in-flight requests after the
    /// connection closes.
    pub drain_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: SERVER_VERSION.to_string(),
            instructions: None,
            drain_timeout: Duration::from_secs(DEFAULT_DRAIN_TIMEOUT_SECS),
        }
    }
}

impl ServerConfig {
    /// Resolve from explicit values, falling back to the environment, then
    /// defaults.
    pub fn resolve(instructions: Option<&str>, drain_timeout_secs: Option<u64>) -> Self {
        Self {
            instructions: resolve_instructions(instructions),
            drain_timeout: resolve_drain_timeout(drain_timeout_secs),
            ..Self::default()
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }
}

/// Resolve the `initialize` instructions text.
pub fn resolve_instructions(explicit: Option<&str>) -> Option<String> {
    if let Some(text) = explicit {
        return Some(text.to_string());
    }

    if let Ok(env_text) = std::env::var("HOSTCAP_INSTRUCTIONS") {
        if !env_text.trim().is_empty() {
            return Some(env_text);
        }
    }

    None
}

/// Resolve the shutdown drain timeout.
pub fn resolve_drain_timeout(explicit: Option<u64>) -> Duration {
    if let Some(secs) = explicit {
        return Duration::from_secs(secs);
    }

    match std::env::var("HOSTCAP_DRAIN_TIMEOUT_SECS") {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                tracing::warn!("Ignoring invalid HOSTCAP_DRAIN_TIMEOUT_SECS={raw}");
                Duration::from_secs(DEFAULT_DRAIN_TIMEOUT_SECS)
            }
        },
        Err(_) => Duration::from_secs(DEFAULT_DRAIN_TIMEOUT_SECS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_values_win() {
        let config = ServerConfig::resolve(Some("use the tools"), Some(12));
        assert_eq!(config.instructions.as_deref(), Some("use the tools"));
        assert_eq!(config.drain_timeout, Duration::from_secs(12));
        assert_eq!(config.name, SERVER_NAME);
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert!(config.instructions.is_none());
        assert_eq!(config.drain_timeout, Duration::from_secs(DEFAULT_DRAIN_TIMEOUT_SECS));
    }
}
