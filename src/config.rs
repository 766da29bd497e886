//! # Configuration Management
//!
//! Protocol constants and the optional configuration layer for embedding applications.
//!
//! The constants in this module must match byte-for-byte across every implementation
//! of the protocol. [`ProtocolConfig`] only chooses *defaults* for callers (which
//! format to emit, how strictly to validate, how to log); the codec and validator
//! themselves are pure functions and never read configuration or the environment.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment-specific overrides via `from_env()`

use crate::core::serialization::{SerializationFormat, SerializeOptions};
use crate::error::{ProtocolError, Result};
use crate::protocol::validation::ValidationOptions;
use crate::utils::compression::CompressionKind;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

/// Version triple plus the protocol name that messages carry in `version`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
    pub name: &'static str,
}

/// Current protocol version
pub const PROTOCOL_VERSION: ProtocolVersion = ProtocolVersion {
    major: 1,
    minor: 0,
    patch: 0,
    name: "SillyChat-Protocol-v1",
};

/// Protocol name every accepted message must carry
pub const PROTOCOL_NAME: &str = PROTOCOL_VERSION.name;

/// Binary schema revision written into every binary frame header
pub const BINARY_SCHEMA_VERSION: u8 = 1;

/// Magic bytes opening every binary frame. `0x93` is a UTF-8 continuation byte,
/// so no text document can begin with it.
pub const MAGIC_BYTES: [u8; 4] = [0x93, 0x53, 0x43, 0x50];

/// Max size of a whole message (10 MB)
pub const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// Max text content length, in characters (64K)
pub const MAX_TEXT_LENGTH: usize = 64 * 1024;

/// Max file size for a transfer (1 GB)
pub const MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;

/// Default file chunk size (64 KB)
pub const FILE_CHUNK_SIZE: u32 = 64 * 1024;

/// Max binary frame payload, batches included (64 MB)
pub const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// Max entries in an agent command's history
pub const MAX_HISTORY_MESSAGES: usize = 100;

/// Default agent command timeout (30 seconds)
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 30_000;

/// Max agent command timeout (5 minutes)
pub const MAX_COMMAND_TIMEOUT_MS: u64 = 5 * 60 * 1000;

/// ID length bounds
pub const ID_MIN_LENGTH: usize = 8;
pub const ID_MAX_LENGTH: usize = 64;

/// Default permission level for new auth contexts (guest)
pub const DEFAULT_PERMISSION_LEVEL: u8 = 20;

/// Default age after which a message without `expiresAt` counts as expired (24 hours)
pub const DEFAULT_MAX_MESSAGE_AGE_MS: u64 = 86_400_000;

/// Default preview length, in characters
pub const DEFAULT_PREVIEW_LENGTH: usize = 100;

/// How far in the future a timestamp may be before it is rejected (24 hours)
pub const MAX_CLOCK_SKEW_MS: u64 = 86_400_000;

/// Whether to compress binary frames by default
pub const ENABLE_COMPRESSION: bool = false;

/// Payloads shorter than this are never compressed
pub const DEFAULT_COMPRESSION_THRESHOLD_BYTES: usize = 512;

/// Top-level configuration for applications embedding the protocol
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ProtocolConfig {
    /// Codec defaults
    #[serde(default)]
    pub serialization: SerializationConfig,

    /// Validator defaults
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ProtocolConfig {
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

    /// Load configuration from environment variables
    ///
    /// Unset variables keep their defaults; a set but unparsable one is a
    /// [`ProtocolError::ConfigError`].
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through `lookup`
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(format) = lookup("SILLYCHAT_PROTOCOL_DEFAULT_FORMAT") {
            config.serialization.default_format = format.parse().map_err(|_| {
                ProtocolError::ConfigError(format!("Unknown serialization format: {format}"))
            })?;
        }

        if let Some(size) = lookup("SILLYCHAT_PROTOCOL_MAX_MESSAGE_SIZE") {
            let val = size.parse::<usize>().map_err(|e| {
                ProtocolError::ConfigError(format!("Invalid max message size {size:?}: {e}"))
            })?;
            config.serialization.max_message_size = val;
            config.validation.max_message_size = Some(val);
        }

        if let Some(strict) = lookup("SILLYCHAT_PROTOCOL_STRICT") {
            config.validation.strict = strict.parse::<bool>().map_err(|_| {
                ProtocolError::ConfigError(format!("Invalid strict flag {strict:?}: expected true or false"))
            })?;
        }

        if let Some(kind) = lookup("SILLYCHAT_PROTOCOL_COMPRESSION") {
            match kind.to_ascii_lowercase().as_str() {
                "none" | "off" => config.serialization.compression_enabled = false,
                "lz4" => {
                    config.serialization.compression_enabled = true;
                    config.serialization.compression_kind = CompressionKind::Lz4;
                }
                "zstd" => {
                    config.serialization.compression_enabled = true;
                    config.serialization.compression_kind = CompressionKind::Zstd;
                }
                other => {
                    return Err(ProtocolError::ConfigError(format!(
                        "Unknown compression kind: {other}"
                    )))
                }
            }
        }

        if let Some(level) = lookup("SILLYCHAT_PROTOCOL_LOG_LEVEL") {
            config.logging.log_level = level
                .parse::<Level>()
                .map_err(|_| ProtocolError::ConfigError(format!("Invalid log level: {level}")))?;
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

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.serialization.validate());
        errors.extend(self.validation.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
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

/// Codec defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SerializationConfig {
    /// Format used when a caller does not pick one
    pub default_format: SerializationFormat,

    /// Whether binary frames are compressed
    pub compression_enabled: bool,

    /// Compression algorithm for binary frames
    pub compression_kind: CompressionKind,

    /// Minimum payload size (bytes) before compression is applied
    #[serde(default = "default_compression_threshold")]
    pub compression_threshold_bytes: usize,

    /// Largest single encoded message the codec will produce
    pub max_message_size: usize,
}

fn default_compression_threshold() -> usize {
    DEFAULT_COMPRESSION_THRESHOLD_BYTES
}

impl Default for SerializationConfig {
    fn default() -> Self {
        Self {
            default_format: SerializationFormat::default(),
            compression_enabled: ENABLE_COMPRESSION,
            compression_kind: CompressionKind::Lz4,
            compression_threshold_bytes: DEFAULT_COMPRESSION_THRESHOLD_BYTES,
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }
}

impl SerializationConfig {
    /// Build codec options from this configuration
    pub fn to_options(&self) -> SerializeOptions {
        SerializeOptions {
            format: self.default_format,
            compression: self.compression_enabled.then_some(self.compression_kind),
            compression_threshold_bytes: self.compression_threshold_bytes,
            max_message_size: self.max_message_size,
        }
    }

    /// Validate serialization configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_message_size == 0 {
            errors.push("Max message size cannot be 0".to_string());
        } else if self.max_message_size < 1024 {
            errors.push("Max message size too small (minimum: 1 KB)".to_string());
        } else if self.max_message_size > MAX_MESSAGE_SIZE {
            errors.push(format!(
                "Max message size too large: {} bytes (protocol maximum: {MAX_MESSAGE_SIZE})",
                self.max_message_size
            ));
        }

        if self.compression_enabled && self.compression_threshold_bytes > self.max_message_size {
            errors.push("Compression threshold cannot be larger than max message size".to_string());
        }

        if self.compression_enabled && self.default_format == SerializationFormat::Json {
            errors.push(
                "WARNING: Compression only applies to binary frames; JSON output stays uncompressed"
                    .to_string(),
            );
        }

        errors
    }
}

/// Validator defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidationConfig {
    /// Treat identifier-pattern findings as errors instead of warnings
    pub strict: bool,

    /// Estimated-size ceiling; `None` skips the size estimate
    #[serde(default)]
    pub max_message_size: Option<usize>,

    /// Flag messages whose auth level is below the tier their variant requires
    pub validate_permissions: bool,

    /// Age after which a message without `expiresAt` is reported as expired
    #[serde(with = "duration_serde")]
    pub max_message_age: Duration,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            strict: false,
            max_message_size: Some(MAX_MESSAGE_SIZE),
            validate_permissions: false,
            max_message_age: Duration::from_millis(DEFAULT_MAX_MESSAGE_AGE_MS),
        }
    }
}

impl ValidationConfig {
    /// Build validator options from this configuration
    pub fn to_options(&self) -> ValidationOptions {
        ValidationOptions {
            strict: self.strict,
            max_message_size: self.max_message_size,
            validate_permissions: self.validate_permissions,
            now_ms: None,
            max_message_age_ms: Some(u64::try_from(self.max_message_age.as_millis()).unwrap_or(u64::MAX)),
        }
    }

    /// Validate validator configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Some(size) = self.max_message_size {
            if size == 0 {
                errors.push("Validation max message size cannot be 0".to_string());
            } else if size > MAX_MESSAGE_SIZE {
                errors.push(format!(
                    "Validation max message size too large: {size} bytes (protocol maximum: {MAX_MESSAGE_SIZE})"
                ));
            }
        }

        if self.max_message_age.as_millis() == 0 {
            errors.push("Max message age must be greater than 0".to_string());
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to log to console
    pub log_to_console: bool,

    /// Whether to log to file
    pub log_to_file: bool,

    /// Path to log file (if log_to_file is true)
    pub log_file_path: Option<String>,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("sillychat-protocol"),
            log_level: Level::INFO,
            log_to_console: true,
            log_to_file: false,
            log_file_path: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
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

        if self.log_to_file {
            if let Some(ref path) = self.log_file_path {
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        errors.push(format!(
                            "Log file directory does not exist: {}",
                            parent.display()
                        ));
                    }
                }
            } else {
                errors.push("log_file_path must be specified when log_to_file is true".to_string());
            }
        }

        if !self.log_to_console && !self.log_to_file {
            errors
                .push("At least one logging output (console or file) must be enabled".to_string());
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
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
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
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
