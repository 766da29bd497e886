//! # Binary Frame
//!
//! Envelope for every binary-encoded value.
//!
//! ## Layout
//! ```text
//! [Magic(4) = 0x93 'S' 'C' 'P'] [Schema(1)] [Kind(1)] [Flags(1)] [Length(4, BE)] [Payload(Length)]
//! ```
//!
//! - `Schema` is [`BINARY_SCHEMA_VERSION`]; anything else is rejected
//! - `Flags` bit 0 marks LZ4, bit 1 Zstd; the bits are exclusive and the rest must be zero
//! - `Length` is checked against [`MAX_FRAME_SIZE`] before anything is allocated
//! - A frame is exactly header + payload; extra bytes are an error, since splitting
//!   a stream into frames is the transport's job

use crate::config::{BINARY_SCHEMA_VERSION, MAGIC_BYTES, MAX_FRAME_SIZE};
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::types::MessageType;
use crate::utils::compression::{compress_if_worthwhile, decompress, CompressionKind};
use bytes::{Buf, BufMut};

/// Bytes before the payload
pub const HEADER_SIZE: usize = 11;

const FLAG_LZ4: u8 = 0b0000_0001;
const FLAG_ZSTD: u8 = 0b0000_0010;

/// What a frame's payload holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Chat,
    Command,
    Event,
    File,
    Chunk,
    Batch,
}

impl FrameKind {
    pub fn as_byte(self) -> u8 {
        match self {
            FrameKind::Chat => 0x01,
            FrameKind::Command => 0x02,
            FrameKind::Event => 0x03,
            FrameKind::File => 0x05,
            FrameKind::Chunk => 0x10,
            FrameKind::Batch => 0x20,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(FrameKind::Chat),
            0x02 => Some(FrameKind::Command),
            0x03 => Some(FrameKind::Event),
            0x05 => Some(FrameKind::File),
            0x10 => Some(FrameKind::Chunk),
            0x20 => Some(FrameKind::Batch),
            _ => None,
        }
    }
}

impl From<MessageType> for FrameKind {
    fn from(message_type: MessageType) -> Self {
        match message_type {
            MessageType::Chat => FrameKind::Chat,
            MessageType::Command => FrameKind::Command,
            MessageType::Event => FrameKind::Event,
            MessageType::File => FrameKind::File,
        }
    }
}

/// Whether `data` starts like a binary frame. Looks at no more than the magic bytes.
pub fn has_magic(data: &[u8]) -> bool {
    !data.is_empty() && MAGIC_BYTES.starts_with(&data[..data.len().min(MAGIC_BYTES.len())])
}

/// A parsed or to-be-written binary frame. `payload` is kept exactly as it travels,
/// i.e. still compressed when `compression` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    pub compression: Option<CompressionKind>,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(kind: FrameKind, payload: Vec<u8>) -> Self {
        Self {
            kind,
            compression: None,
            payload,
        }
    }

    /// Frame whose payload is compressed with `compression` when that is worthwhile
    pub fn with_compression(
        kind: FrameKind,
        payload: Vec<u8>,
        compression: CompressionKind,
        threshold_bytes: usize,
    ) -> Result<Self> {
        match compress_if_worthwhile(&payload, compression, threshold_bytes)? {
            Some(packed) => Ok(Self {
                kind,
                compression: Some(compression),
                payload: packed,
            }),
            None => Ok(Self::new(kind, payload)),
        }
    }

    fn flags(&self) -> u8 {
        match self.compression {
            None => 0,
            Some(CompressionKind::Lz4) => FLAG_LZ4,
            Some(CompressionKind::Zstd) => FLAG_ZSTD,
        }
    }

    /// Serialize header and payload
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.payload.len() > MAX_FRAME_SIZE {
            return Err(ProtocolError::Oversized {
                size: self.payload.len(),
                limit: MAX_FRAME_SIZE,
            });
        }

        let mut buf = Vec::with_capacity(HEADER_SIZE + self.payload.len());
        buf.put_slice(&MAGIC_BYTES);
        buf.put_u8(BINARY_SCHEMA_VERSION);
        buf.put_u8(self.kind.as_byte());
        buf.put_u8(self.flags());
        // bounded by MAX_FRAME_SIZE above
        buf.put_u32(self.payload.len() as u32);
        buf.put_slice(&self.payload);
        Ok(buf)
    }

    /// Parse exactly one frame from `data`
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(ProtocolError::Format(constants::ERR_EMPTY_INPUT.into()));
        }
        if !has_magic(data) {
            return Err(ProtocolError::Format(constants::ERR_INVALID_MAGIC.into()));
        }
        if data.len() < HEADER_SIZE {
            return Err(ProtocolError::Format(constants::ERR_TRUNCATED_HEADER.into()));
        }

        let mut header = &data[MAGIC_BYTES.len()..HEADER_SIZE];
        let schema = header.get_u8();
        let kind_byte = header.get_u8();
        let flags = header.get_u8();
        let length = header.get_u32() as usize;

        if schema != BINARY_SCHEMA_VERSION {
            return Err(ProtocolError::UnsupportedSchemaVersion(schema));
        }

        let kind = FrameKind::from_byte(kind_byte).ok_or_else(|| {
            ProtocolError::Format(format!("{}: 0x{kind_byte:02x}", constants::ERR_UNKNOWN_FRAME_KIND))
        })?;

        let compression = match flags {
            0 => None,
            FLAG_LZ4 => Some(CompressionKind::Lz4),
            FLAG_ZSTD => Some(CompressionKind::Zstd),
            _ => {
                return Err(ProtocolError::Format(format!(
                    "{}: 0b{flags:08b}",
                    constants::ERR_INVALID_FLAGS
                )))
            }
        };

        if length > MAX_FRAME_SIZE {
            return Err(ProtocolError::Oversized {
                size: length,
                limit: MAX_FRAME_SIZE,
            });
        }

        let body = &data[HEADER_SIZE..];
        if body.len() < length {
            return Err(ProtocolError::Format(constants::ERR_TRUNCATED_PAYLOAD.into()));
        }
        if body.len() > length {
            return Err(ProtocolError::Format(constants::ERR_TRAILING_BYTES.into()));
        }

        Ok(Self {
            kind,
            compression,
            payload: body.to_vec(),
        })
    }

    /// The payload with any compression undone
    pub fn into_payload(self) -> Result<Vec<u8>> {
        match self.compression {
            None => Ok(self.payload),
            Some(kind) => decompress(&self.payload, kind),
        }
    }
}
