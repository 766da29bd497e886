//! # Protocol Model
//!
//! The SillyChat message model and everything that builds, inspects or checks it.
//!
//! ## Components
//! - **Types**: shared enums, parties, authorization and content payloads
//! - **Message**: the four top-level message kinds plus file chunks, and helpers over them
//! - **Factory**: constructors that fill IDs, timestamps and defaults
//! - **Transfer**: splitting file bytes into chunks and reassembling them
//! - **Validation**: structural, semantic and permission checks with path-addressed findings

pub mod factory;
pub mod message;
pub mod transfer;
pub mod types;
pub mod validation;
