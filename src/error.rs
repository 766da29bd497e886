//! # Error Types
//!
//! Error taxonomy for the SillyChat wire protocol.
//!
//! Codec operations return [`ProtocolError`] through [`Result`]; the validator never
//! returns an error at all and reports [`ValidationError`] values instead. Both views
//! share the same [`ErrorCode`] table so boundary code can emit one code space to peers.
//!
//! ## Error Categories
//! - **Format**: unparseable text or binary input, unknown format
//! - **Schema**: missing or invalid fields, unknown enum values
//! - **Size**: a ceiling was exceeded (text, message, file, frame)
//! - **Permission**: auth level insufficient or token expired (flagged, never enforced here)
//! - **Version**: protocol name or binary schema mismatch
//!
//! ## Example Usage
//! ```rust
//! use sillychat_protocol::core::serialization::deserialize;
//! use sillychat_protocol::error::ErrorCategory;
//! use sillychat_protocol::protocol::message::Message;
//! use tracing::warn;
//!
//! match deserialize::<Message>(b"{not json", None) {
//!     Ok(decoded) => println!("got {}", decoded.data.id()),
//!     Err(e) => {
//!         assert_eq!(e.category(), ErrorCategory::Format);
//!         warn!(error = %e, code = e.code().as_str(), "dropping frame");
//!     }
//! }
//! ```

use crate::protocol::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    pub const ERR_EMPTY_INPUT: &str = "Empty input";
    pub const ERR_UNKNOWN_FORMAT: &str = "Unable to detect serialization format";
    pub const ERR_INVALID_MAGIC: &str = "Invalid binary frame magic bytes";
    pub const ERR_TRUNCATED_HEADER: &str = "Binary frame shorter than header";
    pub const ERR_TRUNCATED_PAYLOAD: &str = "Binary frame shorter than declared payload length";
    pub const ERR_TRAILING_BYTES: &str = "Trailing bytes after binary frame payload";
    pub const ERR_UNKNOWN_FRAME_KIND: &str = "Unknown binary frame kind";
    pub const ERR_INVALID_FLAGS: &str = "Invalid binary frame flags";
    pub const ERR_FRAME_KIND_MISMATCH: &str = "Frame kind does not match decoded value";
    pub const ERR_TRUNCATED_BATCH: &str = "Batch payload truncated";
    pub const ERR_BATCH_COUNT: &str = "Batch entry count does not match payload";
    pub const ERR_COMPRESSED_BATCH_ENTRY: &str = "Batch entries must not be compressed individually";
}

/// Category of a failure, following the protocol's error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Format,
    Schema,
    Size,
    Permission,
    Version,
    Transport,
    Transfer,
}

/// Wire-stable error codes shared with every other implementation of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation (1000-1999)
    ValidationInvalidFormat,
    ValidationMissingField,
    ValidationInvalidType,
    ValidationSizeExceeded,
    ValidationInvalidId,
    ValidationInvalidTimestamp,
    ValidationInvalidSignature,
    ValidationVersionMismatch,

    // Serialization (2000-2999)
    SerializationFailed,
    DeserializationFailed,
    UnsupportedFormat,
    CompressionFailed,

    // Permission (3000-3999)
    PermissionDenied,
    InvalidToken,
    TokenExpired,
    InsufficientLevel,

    // Transport (4000-4999)
    TransportFailed,
    ConnectionLost,
    Timeout,
    RateLimited,

    // File transfer (5000-5999)
    FileNotFound,
    FileTooLarge,
    ChecksumMismatch,
    TransferCancelled,
}

impl ErrorCode {
    /// All codes, in table order.
    pub const ALL: [ErrorCode; 24] = [
        ErrorCode::ValidationInvalidFormat,
        ErrorCode::ValidationMissingField,
        ErrorCode::ValidationInvalidType,
        ErrorCode::ValidationSizeExceeded,
        ErrorCode::ValidationInvalidId,
        ErrorCode::ValidationInvalidTimestamp,
        ErrorCode::ValidationInvalidSignature,
        ErrorCode::ValidationVersionMismatch,
        ErrorCode::SerializationFailed,
        ErrorCode::DeserializationFailed,
        ErrorCode::UnsupportedFormat,
        ErrorCode::CompressionFailed,
        ErrorCode::PermissionDenied,
        ErrorCode::InvalidToken,
        ErrorCode::TokenExpired,
        ErrorCode::InsufficientLevel,
        ErrorCode::TransportFailed,
        ErrorCode::ConnectionLost,
        ErrorCode::Timeout,
        ErrorCode::RateLimited,
        ErrorCode::FileNotFound,
        ErrorCode::FileTooLarge,
        ErrorCode::ChecksumMismatch,
        ErrorCode::TransferCancelled,
    ];

    /// The numeric string sent on the wire
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ValidationInvalidFormat => "1000",
            ErrorCode::ValidationMissingField => "1001",
            ErrorCode::ValidationInvalidType => "1002",
            ErrorCode::ValidationSizeExceeded => "1003",
            ErrorCode::ValidationInvalidId => "1004",
            ErrorCode::ValidationInvalidTimestamp => "1005",
            ErrorCode::ValidationInvalidSignature => "1006",
            ErrorCode::ValidationVersionMismatch => "1007",
            ErrorCode::SerializationFailed => "2000",
            ErrorCode::DeserializationFailed => "2001",
            ErrorCode::UnsupportedFormat => "2002",
            ErrorCode::CompressionFailed => "2003",
            ErrorCode::PermissionDenied => "3000",
            ErrorCode::InvalidToken => "3001",
            ErrorCode::TokenExpired => "3002",
            ErrorCode::InsufficientLevel => "3003",
            ErrorCode::TransportFailed => "4000",
            ErrorCode::ConnectionLost => "4001",
            ErrorCode::Timeout => "4002",
            ErrorCode::RateLimited => "4003",
            ErrorCode::FileNotFound => "5000",
            ErrorCode::FileTooLarge => "5001",
            ErrorCode::ChecksumMismatch => "5002",
            ErrorCode::TransferCancelled => "5003",
        }
    }

    /// Parse a wire code back into an [`ErrorCode`]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == code)
    }

    /// Taxonomy bucket for this code
    pub fn category(self) -> ErrorCategory {
        match self {
            ErrorCode::ValidationInvalidFormat
            | ErrorCode::SerializationFailed
            | ErrorCode::DeserializationFailed
            | ErrorCode::UnsupportedFormat
            | ErrorCode::CompressionFailed => ErrorCategory::Format,
            ErrorCode::ValidationMissingField
            | ErrorCode::ValidationInvalidType
            | ErrorCode::ValidationInvalidId
            | ErrorCode::ValidationInvalidTimestamp => ErrorCategory::Schema,
            ErrorCode::ValidationSizeExceeded | ErrorCode::FileTooLarge => ErrorCategory::Size,
            ErrorCode::ValidationInvalidSignature
            | ErrorCode::PermissionDenied
            | ErrorCode::InvalidToken
            | ErrorCode::TokenExpired
            | ErrorCode::InsufficientLevel => ErrorCategory::Permission,
            ErrorCode::ValidationVersionMismatch => ErrorCategory::Version,
            ErrorCode::TransportFailed
            | ErrorCode::ConnectionLost
            | ErrorCode::Timeout
            | ErrorCode::RateLimited => ErrorCategory::Transport,
            ErrorCode::FileNotFound | ErrorCode::ChecksumMismatch | ErrorCode::TransferCancelled => {
                ErrorCategory::Transfer
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        ErrorCode::from_code(&code)
            .ok_or_else(|| serde::de::Error::custom(format!("Unknown error code: {code}")))
    }
}

// ProtocolError is the primary error type for all codec operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed input: {0}")]
    Format(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("Unsupported serialization format")]
    UnsupportedFormat,

    #[error("Payload too large: {size} bytes (limit {limit})")]
    Oversized { size: usize, limit: usize },

    #[error("Unsupported protocol version: {0}")]
    UnsupportedVersion(String),

    #[error("Unsupported binary schema version: {0}")]
    UnsupportedSchemaVersion(u8),

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Compression failed")]
    CompressionFailure,

    #[error("Decompression failed")]
    DecompressionFailure,

    #[error("Validation failed with {} error(s)", .0.len())]
    Validation(Vec<ValidationError>),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ProtocolError {
    /// Wire error code for this failure
    pub fn code(&self) -> ErrorCode {
        match self {
            ProtocolError::Io(_) => ErrorCode::TransportFailed,
            ProtocolError::Format(_) => ErrorCode::DeserializationFailed,
            ProtocolError::Schema(_) => ErrorCode::ValidationInvalidFormat,
            ProtocolError::Serialize(_) => ErrorCode::SerializationFailed,
            ProtocolError::UnsupportedFormat => ErrorCode::UnsupportedFormat,
            ProtocolError::Oversized { .. } => ErrorCode::ValidationSizeExceeded,
            ProtocolError::UnsupportedVersion(_) | ProtocolError::UnsupportedSchemaVersion(_) => {
                ErrorCode::ValidationVersionMismatch
            }
            ProtocolError::ChecksumMismatch { .. } => ErrorCode::ChecksumMismatch,
            ProtocolError::CompressionFailure | ProtocolError::DecompressionFailure => {
                ErrorCode::CompressionFailed
            }
            ProtocolError::Validation(errors) => errors
                .first()
                .map(|e| e.code)
                .unwrap_or(ErrorCode::ValidationInvalidFormat),
            ProtocolError::ConfigError(_) => ErrorCode::ValidationInvalidFormat,
        }
    }

    /// Taxonomy bucket for this failure
    pub fn category(&self) -> ErrorCategory {
        match self {
            // decode-time schema failures are reported as schema, even though their
            // wire code is the generic format code
            ProtocolError::Schema(_) => ErrorCategory::Schema,
            other => other.code().category(),
        }
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
