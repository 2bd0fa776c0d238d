//! # Configuration Management
//!
//! Client-side settings: transport timeouts, frame limits and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()` / `from_toml()`
//! - Direct instantiation with defaults
//! - Environment overrides via `from_env()` (`ARENA_CLIENT_*`)
//!
//! The handshake and the correlator define no timeouts of their own; every
//! bound on waiting comes from [`ClientConfig`] and is applied at the
//! transport.

use crate::error::{ProtocolError, Result};
use crate::utils::timeout;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

/// Largest frame accepted by default (1 MiB)
pub const MAX_FRAME_LENGTH: usize = 1024 * 1024;

/// Prefix of every environment variable read by `from_env`
pub const ENV_PREFIX: &str = "ARENA_CLIENT_";

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct GameConfig {
    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GameConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Defaults overridden by `ARENA_CLIENT_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(format!("{ENV_PREFIX}{key}")).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup. Split out so tests do not
    /// have to touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn millis(key: &str, raw: String) -> Result<Duration> {
            raw.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ProtocolError::ConfigError(format!("{ENV_PREFIX}{key}: not a number: {raw}")))
        }

        if let Some(raw) = lookup("CONNECT_TIMEOUT_MS") {
            self.client.connect_timeout = millis("CONNECT_TIMEOUT_MS", raw)?;
        }
        if let Some(raw) = lookup("READ_TIMEOUT_MS") {
            self.client.read_timeout = millis("READ_TIMEOUT_MS", raw)?;
        }
        if let Some(raw) = lookup("WRITE_TIMEOUT_MS") {
            self.client.write_timeout = millis("WRITE_TIMEOUT_MS", raw)?;
        }
        if let Some(raw) = lookup("MAX_FRAME_LENGTH") {
            self.client.max_frame_length = raw.parse().map_err(|_| {
                ProtocolError::ConfigError(format!("{ENV_PREFIX}MAX_FRAME_LENGTH: not a number: {raw}"))
            })?;
        }
        if let Some(raw) = lookup("LOG_LEVEL") {
            self.logging.log_level = raw
                .parse()
                .map_err(|_| ProtocolError::ConfigError(format!("Invalid log level: {raw}")))?;
        }
        if let Some(raw) = lookup("LOG_JSON") {
            self.logging.json_format = matches!(raw.as_str(), "1" | "true" | "yes");
        }
        Ok(())
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Returns a list of problems. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = self.client.validate();
        errors.extend(self.logging.validate());
        errors
    }

    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Transport settings for the game connection
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Bound on dialing the game server
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,

    /// Bound on waiting for one complete frame
    #[serde(with = "duration_serde")]
    pub read_timeout: Duration,

    /// Bound on writing one frame
    #[serde(with = "duration_serde")]
    pub write_timeout: Duration,

    /// Longest accepted frame, delimiter excluded
    pub max_frame_length: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: timeout::CONNECT_TIMEOUT,
            read_timeout: timeout::DEFAULT_TIMEOUT,
            write_timeout: timeout::DEFAULT_TIMEOUT,
            max_frame_length: MAX_FRAME_LENGTH,
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.connect_timeout.as_millis() < 100 {
            errors.push("Connect timeout too short (minimum: 100ms)".to_string());
        } else if self.connect_timeout.as_secs() > 300 {
            errors.push("Connect timeout too long (maximum: 300s)".to_string());
        }

        if self.read_timeout.as_millis() < 100 {
            errors.push("Read timeout too short (minimum: 100ms)".to_string());
        }

        if self.write_timeout.as_millis() < 10 {
            errors.push("Write timeout too short (minimum: 10ms)".to_string());
        }

        // A sealed empty JSON object still needs ~60 bytes of base64
        if self.max_frame_length < 1024 {
            errors.push("Max frame length too small (minimum: 1 KB)".to_string());
        } else if self.max_frame_length > 64 * 1024 * 1024 {
            errors.push(format!(
                "Max frame length too large: {} bytes (maximum: 64 MB)",
                self.max_frame_length
            ));
        }

        errors
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Default level when `RUST_LOG` is unset
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("arena-client"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        level.as_str().to_ascii_lowercase().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
