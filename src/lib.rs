//! # SillyChat Protocol
//!
//! The canonical wire contract shared by the SillyChat gateway, storage engine and
//! clients: one message model, two interchangeable encodings and a validator.
//!
//! ## Layout
//! - [`protocol`]: message model, factories, file-transfer helpers, validation
//! - [`core`]: binary framing and the JSON/binary codec
//! - [`config`]: protocol constants and the optional configuration layer
//! - [`error`]: error type, cross-implementation error codes and categories
//! - [`utils`]: checksums, compression, clock, logging setup
//!
//! Every operation is synchronous and free of shared state, so values and functions
//! can be used from any number of threads or tasks without locking. Nothing here
//! transports bytes or persists data; that belongs to the embedding application.
//!
//! ## Example
//! ```rust
//! use sillychat_protocol::{deserialize, serialize, validate_message, Message, SerializeOptions};
//! use sillychat_protocol::protocol::factory::{
//!     create_direct_target, create_guest_auth, create_human_sender, create_text_message,
//! };
//! use sillychat_protocol::protocol::validation::ValidationOptions;
//!
//! let message = Message::from(create_text_message(
//!     create_human_sender("u1", "d1", None),
//!     create_direct_target("c1"),
//!     "Hello, World!",
//!     create_guest_auth(None),
//!     None,
//! ));
//! assert!(validate_message(&message, &ValidationOptions::default()).valid);
//!
//! let encoded = serialize(&message, &SerializeOptions::default())?;
//! let decoded = deserialize::<Message>(&encoded.data, None)?;
//! assert_eq!(decoded.data, message);
//! # Ok::<(), sillychat_protocol::ProtocolError>(())
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod utils;

pub use crate::config::{ProtocolConfig, PROTOCOL_NAME, PROTOCOL_VERSION};
pub use crate::core::serialization::{
    deserialize, deserialize_batch, detect_format, estimate_size, serialize, serialize_batch,
    Decoded, Encoded, MultiFormat, SerializationFormat, SerializeOptions,
};
pub use crate::error::{ErrorCategory, ErrorCode, ProtocolError, Result};
pub use crate::protocol::message::{
    AgentCommand, ChatMessage, FileChunk, FileTransfer, Message, SystemEvent,
};
pub use crate::protocol::validation::{
    check_version_compatibility, validate_message, ValidationError, ValidationResult,
};
