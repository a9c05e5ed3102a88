//! # Configuration Management
//!
//! Centralized configuration for the gateway.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Environment variables via `from_env()` (`GATEWAY_*`)
//! - Direct instantiation with defaults
//!
//! All values are read once at startup; nothing here is reloaded while
//! connections are live. Validation failures are fatal before the listen
//! socket is bound.

use crate::error::{GatewayError, Result};
use crate::utils::compression::CompressionLevel;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::Level;

/// Default listen port.
pub const DEFAULT_SERVER_PORT: u16 = 15000;

/// Default process-wide session ceiling.
pub const DEFAULT_CLIENT_LIMIT_TOTAL: usize = 8;

/// Default per-source-address session ceiling.
pub const DEFAULT_CLIENT_LIMIT_PER_ADDRESS: usize = 4;

/// Default cap on a frame's compressed size, in bytes.
pub const DEFAULT_CLIENT_BUFFER_CAPACITY: usize = 128;

/// Main configuration structure containing all configurable settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct GatewayConfig {
    /// Listen socket configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Admission ceilings and buffer bounds
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Wire transport configuration
    #[serde(default)]
    pub transport: TransportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GatewayConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| GatewayError::ConfigError(format!("failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| GatewayError::ConfigError(format!("failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| GatewayError::ConfigError(format!("failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables, starting from defaults.
    ///
    /// Any `GATEWAY_*` variable that is present but unparsable is a hard
    /// error rather than a silent fallback to the default.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(port) = std::env::var("GATEWAY_SERVER_PORT") {
            config.server.port = port
                .parse::<u16>()
                .map_err(|_| GatewayError::ConfigError(format!("invalid port '{port}'")))?;
        }

        if let Ok(total) = std::env::var("GATEWAY_CLIENT_LIMIT_TOTAL") {
            config.limits.client_count_limit_total = total.parse::<usize>().map_err(|_| {
                GatewayError::ConfigError(format!("invalid total client limit '{total}'"))
            })?;
        }

        if let Ok(per_address) = std::env::var("GATEWAY_CLIENT_LIMIT_PER_ADDRESS") {
            config.limits.client_count_limit_per_address =
                per_address.parse::<usize>().map_err(|_| {
                    GatewayError::ConfigError(format!(
                        "invalid per-address client limit '{per_address}'"
                    ))
                })?;
        }

        if let Ok(capacity) = std::env::var("GATEWAY_CLIENT_BUFFER_CAPACITY") {
            config.limits.client_buffer_capacity = capacity.parse::<usize>().map_err(|_| {
                GatewayError::ConfigError(format!("invalid buffer capacity '{capacity}'"))
            })?;
        }

        if let Ok(level) = std::env::var("GATEWAY_COMPRESSION_LEVEL") {
            config.transport.compression_level = level.parse()?;
        }

        Ok(config)
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

    /// Validate the configuration for common misconfigurations.
    ///
    /// Returns a list of validation errors. Empty list means the
    /// configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.server.validate());
        errors.extend(self.limits.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(GatewayError::ConfigError(format!(
                "configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Listen socket configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Listen port. 0 binds an ephemeral port.
    pub port: u16,

    /// Address to bind on
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_SERVER_PORT,
            bind_address: String::from("0.0.0.0"),
        }
    }
}

impl ServerConfig {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.bind_address.is_empty() {
            errors.push("bind address cannot be empty".to_string());
        } else if self.bind_address.parse::<std::net::IpAddr>().is_err() {
            errors.push(format!(
                "invalid bind address: '{}' (expected an IP address)",
                self.bind_address
            ));
        }
        errors
    }
}

/// Admission ceilings and buffer bounds
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// Maximum number of simultaneous sessions, process-wide
    pub client_count_limit_total: usize,

    /// Maximum number of simultaneous sessions per source address
    pub client_count_limit_per_address: usize,

    /// Maximum compressed frame size a session will accept or queue, in bytes
    pub client_buffer_capacity: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            client_count_limit_total: DEFAULT_CLIENT_LIMIT_TOTAL,
            client_count_limit_per_address: DEFAULT_CLIENT_LIMIT_PER_ADDRESS,
            client_buffer_capacity: DEFAULT_CLIENT_BUFFER_CAPACITY,
        }
    }
}

impl LimitsConfig {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.client_count_limit_total == 0 {
            errors.push("total client limit must be greater than 0".to_string());
        }

        if self.client_count_limit_per_address == 0 {
            errors.push("per-address client limit must be greater than 0".to_string());
        } else if self.client_count_limit_per_address > self.client_count_limit_total {
            errors.push(format!(
                "per-address limit {} exceeds total limit {}",
                self.client_count_limit_per_address, self.client_count_limit_total
            ));
        }

        if self.client_buffer_capacity == 0 {
            errors.push("client buffer capacity must be greater than 0".to_string());
        } else if self.client_buffer_capacity > 100 * 1024 * 1024 {
            errors.push(format!(
                "client buffer capacity too large: {} bytes (maximum: 100 MB)",
                self.client_buffer_capacity
            ));
        }

        errors
    }
}

/// Wire transport configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TransportConfig {
    /// Compression level applied to outgoing frames
    #[serde(default)]
    pub compression_level: CompressionLevel,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            json_format: false,
        }
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
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("invalid log level: {level_str}")))
    }
}
