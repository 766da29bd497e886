//! # Core Codec Components
//!
//! Binary framing and the JSON/binary serialization codec.
//!
//! ## Components
//! - **Frame**: binary envelope with magic bytes, schema version, kind and compression flags
//! - **Serialization**: encode/decode, format detection, batches and size estimates
//!
//! ## Wire Format
//! ```text
//! [Magic(4)] [Schema(1)] [Kind(1)] [Flags(1)] [Length(4)] [Payload(N)]
//! ```
//!
//! ## Limits
//! - Maximum frame payload: 64MB, checked before allocation
//! - Exactly one frame per input; trailing bytes are rejected

pub mod frame;
pub mod serialization;
