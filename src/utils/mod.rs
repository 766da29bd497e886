//! # Utility Modules
//!
//! Supporting pieces shared by the codec and the validator.
//!
//! ## Components
//! - **Checksum**: SHA-256 digests of encoded bytes and file chunks
//! - **Compression**: optional LZ4/Zstd for binary frames, with a decompression ceiling
//! - **Logging**: tracing subscriber setup for embedding applications
//! - **Time**: epoch-millisecond clock and base36 rendering for IDs

pub mod checksum;
pub mod compression;
pub mod logging;
pub mod time;

pub use checksum::{checksum, verify_checksum};
pub use compression::CompressionKind;
