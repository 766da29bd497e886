//! # Serialization Codec
//!
//! Bidirectional mapping between protocol values and the two wire encodings.
//!
//! ## Formats
//! - **JSON**: UTF-8 text with camelCase field names, for debugging, HTTP and
//!   cross-language interop. Chunk bytes are standard base64.
//! - **Binary**: MessagePack with named fields inside a [`Frame`]. Chunk bytes are
//!   raw `bin` strings. Frames may be compressed.
//!
//! The first byte of a binary frame (`0x93`) can never start a UTF-8 document, so
//! [`detect_format`] only needs to look at the leading bytes.
//!
//! ## Usage
//! ```rust
//! use sillychat_protocol::core::serialization::{deserialize, serialize, SerializeOptions};
//! use sillychat_protocol::protocol::factory::{
//!     create_direct_target, create_guest_auth, create_human_sender, create_text_message,
//! };
//! use sillychat_protocol::protocol::message::Message;
//!
//! let message = Message::from(create_text_message(
//!     create_human_sender("u1", "d1", None),
//!     create_direct_target("c1"),
//!     "Hello, World!",
//!     create_guest_auth(None),
//!     None,
//! ));
//!
//! let encoded = serialize(&message, &SerializeOptions::binary())?;
//! let decoded = deserialize::<Message>(&encoded.data, None)?;
//! assert_eq!(decoded.data, message);
//! # Ok::<(), sillychat_protocol::error::ProtocolError>(())
//! ```

use crate::config::{DEFAULT_COMPRESSION_THRESHOLD_BYTES, MAX_FRAME_SIZE, MAX_MESSAGE_SIZE};
use crate::core::frame::{has_magic, Frame, FrameKind, HEADER_SIZE};
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::message::{FileChunk, Message};
use crate::utils::checksum::{checksum, verify_checksum};
use crate::utils::compression::CompressionKind;
use bytes::{Buf, BufMut};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io;
use std::str::FromStr;
use tracing::{debug, instrument, warn};

/// Wire encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializationFormat {
    /// Human-readable text (default)
    #[default]
    Json,
    /// Compact framed MessagePack
    Binary,
}

impl SerializationFormat {
    /// Identifier byte, for transports that carry a format hint out of band
    pub fn format_byte(self) -> u8 {
        match self {
            SerializationFormat::Json => 0x01,
            SerializationFormat::Binary => 0x02,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(SerializationFormat::Json),
            0x02 => Some(SerializationFormat::Binary),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SerializationFormat::Json => "JSON",
            SerializationFormat::Binary => "Binary",
        }
    }
}

impl FromStr for SerializationFormat {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(SerializationFormat::Json),
            "binary" => Ok(SerializationFormat::Binary),
            _ => Err(ProtocolError::UnsupportedFormat),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeOptions {
    pub format: SerializationFormat,
    /// Binary frames only; JSON output is never compressed
    pub compression: Option<CompressionKind>,
    /// Payloads shorter than this are sent uncompressed
    pub compression_threshold_bytes: usize,
    /// Largest encoded single value accepted
    pub max_message_size: usize,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            format: SerializationFormat::Json,
            compression: None,
            compression_threshold_bytes: DEFAULT_COMPRESSION_THRESHOLD_BYTES,
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }
}

impl SerializeOptions {
    pub fn json() -> Self {
        Self::default()
    }

    pub fn binary() -> Self {
        Self {
            format: SerializationFormat::Binary,
            ..Self::default()
        }
    }
}

/// Output of a successful encode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub format: SerializationFormat,
    pub data: Vec<u8>,
    pub byte_length: usize,
    /// Lowercase hex SHA-256 of `data`
    pub checksum: String,
}

impl Encoded {
    fn new(format: SerializationFormat, data: Vec<u8>) -> Self {
        Self {
            format,
            byte_length: data.len(),
            checksum: checksum(&data),
            data,
        }
    }

    /// Check `data` against `checksum`, e.g. after a transport hop
    pub fn verify(&self) -> Result<()> {
        verify_checksum(&self.data, &self.checksum)
    }
}

/// Output of a successful decode
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub data: T,
    pub format: SerializationFormat,
}

fn json_error(e: serde_json::Error) -> ProtocolError {
    match e.classify() {
        serde_json::error::Category::Data => ProtocolError::Schema(e.to_string()),
        _ => ProtocolError::Format(e.to_string()),
    }
}

fn binary_error(e: rmp_serde::decode::Error) -> ProtocolError {
    use rmp_serde::decode::Error;
    match e {
        Error::TypeMismatch(_)
        | Error::OutOfRange
        | Error::LengthMismatch(_)
        | Error::Syntax(_)
        | Error::Uncategorized(_) => ProtocolError::Schema(e.to_string()),
        other => ProtocolError::Format(other.to_string()),
    }
}

/// Values that can travel in either encoding
pub trait MultiFormat: Serialize + DeserializeOwned + Sized {
    /// Frame kind this value is written under
    fn frame_kind(&self) -> FrameKind;

    /// Whether a frame of `kind` may hold a value of this type
    fn accepts_frame(kind: FrameKind) -> bool;

    /// Encode without compression or size ceiling
    fn serialize_format(&self, format: SerializationFormat) -> Result<Vec<u8>> {
        match format {
            SerializationFormat::Json => {
                serde_json::to_vec(self).map_err(|e| ProtocolError::Serialize(e.to_string()))
            }
            SerializationFormat::Binary => Frame::new(self.frame_kind(), to_msgpack(self)?).to_bytes(),
        }
    }

    /// Decode `data` known to be in `format`
    fn deserialize_format(data: &[u8], format: SerializationFormat) -> Result<Self> {
        match format {
            SerializationFormat::Json => serde_json::from_slice(strip_bom(data)).map_err(json_error),
            SerializationFormat::Binary => Self::from_frame(Frame::from_bytes(data)?),
        }
    }

    /// Decode the value carried by an already parsed frame
    fn from_frame(frame: Frame) -> Result<Self> {
        let kind = frame.kind;
        if !Self::accepts_frame(kind) {
            return Err(ProtocolError::Format(format!(
                "{}: {kind:?}",
                constants::ERR_FRAME_KIND_MISMATCH
            )));
        }
        let value: Self = from_msgpack(&frame.into_payload()?)?;
        if value.frame_kind() != kind {
            return Err(ProtocolError::Format(format!(
                "{}: frame says {kind:?}, payload is {:?}",
                constants::ERR_FRAME_KIND_MISMATCH,
                value.frame_kind()
            )));
        }
        Ok(value)
    }
}

impl MultiFormat for Message {
    fn frame_kind(&self) -> FrameKind {
        FrameKind::from(self.message_type())
    }

    fn accepts_frame(kind: FrameKind) -> bool {
        matches!(
            kind,
            FrameKind::Chat | FrameKind::Command | FrameKind::Event | FrameKind::File
        )
    }
}

impl MultiFormat for FileChunk {
    fn frame_kind(&self) -> FrameKind {
        FrameKind::Chunk
    }

    fn accepts_frame(kind: FrameKind) -> bool {
        kind == FrameKind::Chunk
    }
}

fn to_msgpack<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(value).map_err(|e| ProtocolError::Serialize(e.to_string()))
}

/// Deepest MessagePack nesting accepted, the same ceiling serde_json applies to text
const MAX_BINARY_DEPTH: usize = 128;

fn from_msgpack<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    let mut deserializer = rmp_serde::Deserializer::from_read_ref(payload);
    deserializer.set_max_depth(MAX_BINARY_DEPTH);
    T::deserialize(&mut deserializer).map_err(binary_error)
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(UTF8_BOM).unwrap_or(data)
}

fn frame_for<T: MultiFormat>(value: &T, options: &SerializeOptions) -> Result<Frame> {
    let payload = to_msgpack(value)?;
    match options.compression {
        Some(kind) => Frame::with_compression(
            value.frame_kind(),
            payload,
            kind,
            options.compression_threshold_bytes,
        ),
        None => Ok(Frame::new(value.frame_kind(), payload)),
    }
}

/// Encode `value` per `options`, with its checksum
pub fn serialize<T: MultiFormat>(value: &T, options: &SerializeOptions) -> Result<Encoded> {
    let data = match options.format {
        SerializationFormat::Json => value.serialize_format(SerializationFormat::Json)?,
        SerializationFormat::Binary => frame_for(value, options)?.to_bytes()?,
    };

    if data.len() > options.max_message_size {
        warn!(
            format = options.format.name(),
            size = data.len(),
            limit = options.max_message_size,
            "encoded value exceeds size limit"
        );
        return Err(ProtocolError::Oversized {
            size: data.len(),
            limit: options.max_message_size,
        });
    }

    debug!(format = options.format.name(), bytes = data.len(), "encoded value");
    Ok(Encoded::new(options.format, data))
}

pub fn serialize_json<T: MultiFormat>(value: &T) -> Result<Encoded> {
    serialize(value, &SerializeOptions::json())
}

pub fn serialize_binary<T: MultiFormat>(value: &T) -> Result<Encoded> {
    serialize(value, &SerializeOptions::binary())
}

/// Classify `data` by its leading bytes without parsing or allocating.
///
/// Binary frames are recognised by their magic; JSON documents by a `{` or `[`
/// after optional whitespace or a UTF-8 byte order mark.
pub fn detect_format(data: &[u8]) -> Option<SerializationFormat> {
    if has_magic(data) {
        return Some(SerializationFormat::Binary);
    }
    match strip_bom(data).iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') | Some(b'[') => Some(SerializationFormat::Json),
        _ => None,
    }
}

fn resolve_format(data: &[u8], format: Option<SerializationFormat>) -> Result<SerializationFormat> {
    if data.is_empty() {
        return Err(ProtocolError::Format(constants::ERR_EMPTY_INPUT.into()));
    }
    if data.len() > HEADER_SIZE + MAX_FRAME_SIZE {
        return Err(ProtocolError::Oversized {
            size: data.len(),
            limit: HEADER_SIZE + MAX_FRAME_SIZE,
        });
    }
    format
        .or_else(|| detect_format(data))
        .ok_or_else(|| ProtocolError::Format(constants::ERR_UNKNOWN_FORMAT.into()))
}

/// Decode one value. When `format` is `None` it is detected from the leading bytes.
pub fn deserialize<T: MultiFormat>(data: &[u8], format: Option<SerializationFormat>) -> Result<Decoded<T>> {
    let result = resolve_format(data, format)
        .and_then(|format| T::deserialize_format(data, format).map(|data| Decoded { data, format }));

    match &result {
        Ok(decoded) => debug!(format = decoded.format.name(), bytes = data.len(), "decoded value"),
        Err(e) => warn!(bytes = data.len(), code = e.code().as_str(), error = %e, "rejected input"),
    }
    result
}

/// Encode `values` as one unit: a JSON array, or a binary batch frame of inner frames.
///
/// Binary batch payload: `[Count(4, BE)]` then `Count` × `[Len(4, BE)][inner frame]`.
/// Compression, when requested, applies to the outer frame only; inner frames are
/// always stored plain, so the decompression ceiling covers the whole batch.
#[instrument(skip_all, fields(count = values.len(), format = options.format.name()))]
pub fn serialize_batch<T: MultiFormat>(values: &[T], options: &SerializeOptions) -> Result<Encoded> {
    let data = match options.format {
        SerializationFormat::Json => {
            serde_json::to_vec(values).map_err(|e| ProtocolError::Serialize(e.to_string()))?
        }
        SerializationFormat::Binary => {
            let count = u32::try_from(values.len()).map_err(|_| ProtocolError::Oversized {
                size: values.len(),
                limit: u32::MAX as usize,
            })?;

            let mut payload = Vec::new();
            payload.put_u32(count);
            for value in values {
                let inner = value.serialize_format(SerializationFormat::Binary)?;
                if payload.len() + 4 + inner.len() > MAX_FRAME_SIZE {
                    return Err(ProtocolError::Oversized {
                        size: payload.len() + 4 + inner.len(),
                        limit: MAX_FRAME_SIZE,
                    });
                }
                // bounded by MAX_FRAME_SIZE above
                payload.put_u32(inner.len() as u32);
                payload.put_slice(&inner);
            }

            let frame = match options.compression {
                Some(kind) => Frame::with_compression(
                    FrameKind::Batch,
                    payload,
                    kind,
                    options.compression_threshold_bytes,
                )?,
                None => Frame::new(FrameKind::Batch, payload),
            };
            frame.to_bytes()?
        }
    };

    debug!(bytes = data.len(), "encoded batch");
    Ok(Encoded::new(options.format, data))
}

fn decode_binary_batch<T: MultiFormat>(data: &[u8]) -> Result<Vec<T>> {
    let frame = Frame::from_bytes(data)?;
    if frame.kind != FrameKind::Batch {
        return Err(ProtocolError::Format(format!(
            "{}: expected Batch, got {:?}",
            constants::ERR_FRAME_KIND_MISMATCH,
            frame.kind
        )));
    }

    let payload = frame.into_payload()?;
    let mut cursor = payload.as_slice();
    if cursor.remaining() < 4 {
        return Err(ProtocolError::Format(constants::ERR_TRUNCATED_BATCH.into()));
    }
    let count = cursor.get_u32() as usize;

    // each entry needs at least a length prefix and a frame header
    if count > cursor.remaining() / (4 + HEADER_SIZE) {
        return Err(ProtocolError::Format(constants::ERR_BATCH_COUNT.into()));
    }

    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        if cursor.remaining() < 4 {
            return Err(ProtocolError::Format(constants::ERR_TRUNCATED_BATCH.into()));
        }
        let len = cursor.get_u32() as usize;
        if cursor.remaining() < len {
            return Err(ProtocolError::Format(constants::ERR_TRUNCATED_BATCH.into()));
        }
        let (inner, rest) = cursor.split_at(len);
        let frame = Frame::from_bytes(inner)?;
        if frame.compression.is_some() {
            return Err(ProtocolError::Format(constants::ERR_COMPRESSED_BATCH_ENTRY.into()));
        }
        values.push(T::from_frame(frame)?);
        cursor = rest;
    }

    if cursor.has_remaining() {
        return Err(ProtocolError::Format(constants::ERR_TRAILING_BYTES.into()));
    }
    Ok(values)
}

/// Decode a batch produced by [`serialize_batch`]. All-or-nothing: any defect
/// fails the whole batch and no partial list is returned.
#[instrument(skip_all, fields(bytes = data.len()))]
pub fn deserialize_batch<T: MultiFormat>(
    data: &[u8],
    format: Option<SerializationFormat>,
) -> Result<Decoded<Vec<T>>> {
    let result = resolve_format(data, format).and_then(|format| {
        let values = match format {
            SerializationFormat::Json => {
                serde_json::from_slice::<Vec<T>>(strip_bom(data)).map_err(json_error)?
            }
            SerializationFormat::Binary => decode_binary_batch(data)?,
        };
        Ok(Decoded {
            data: values,
            format,
        })
    });

    match &result {
        Ok(decoded) => debug!(count = decoded.data.len(), "decoded batch"),
        Err(e) => warn!(code = e.code().as_str(), error = %e, "rejected batch"),
    }
    result
}

/// `io::Write` sink that only counts
#[derive(Default)]
struct ByteCounter(usize);

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Exact encoded length of `value` in `format` (uncompressed), without building
/// the output
pub fn estimate_size<T: Serialize + ?Sized>(value: &T, format: SerializationFormat) -> Result<usize> {
    let mut counter = ByteCounter::default();
    match format {
        SerializationFormat::Json => {
            serde_json::to_writer(&mut counter, value)
                .map_err(|e| ProtocolError::Serialize(e.to_string()))?;
            Ok(counter.0)
        }
        SerializationFormat::Binary => {
            rmp_serde::encode::write_named(&mut counter, value)
                .map_err(|e| ProtocolError::Serialize(e.to_string()))?;
            Ok(HEADER_SIZE + counter.0)
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;
    use crate::error::ErrorCategory;
    use crate::protocol::factory::{
        create_direct_target, create_file_chunk, create_guest_auth, create_human_sender,
        create_text_message,
    };

    fn message(text: &str) -> Message {
        Message::Chat(create_text_message(
            create_human_sender("u1", "d1", None),
            create_direct_target("c1"),
            text,
            create_guest_auth(None),
            None,
        ))
    }

    #[test]
    fn test_format_byte_roundtrip() {
        for format in [SerializationFormat::Json, SerializationFormat::Binary] {
            assert_eq!(SerializationFormat::from_byte(format.format_byte()), Some(format));
        }
        assert_eq!(SerializationFormat::from_byte(0xFF), None);
        assert_eq!(SerializationFormat::default(), SerializationFormat::Json);
        assert_eq!("Binary".parse::<SerializationFormat>().unwrap(), SerializationFormat::Binary);
        assert!(matches!(
            "protobuf".parse::<SerializationFormat>(),
            Err(ProtocolError::UnsupportedFormat)
        ));
    }

    #[test]
    fn test_json_shape() {
        let encoded = serialize_json(&message("Hello, World!")).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&encoded.data).unwrap();
        assert_eq!(value["type"], "chat");
        assert_eq!(value["content"]["type"], "text");
        assert_eq!(value["content"]["data"], "Hello, World!");
        assert_eq!(value["sender"]["userId"], "u1");
        assert_eq!(value["target"]["channelType"], "direct");
        assert!(value.get("replyTo").is_none());
        assert!(value.get("editHistory").is_none());
    }

    #[test]
    fn test_both_formats_roundtrip_and_detect() {
        let original = message("round trip");
        for options in [SerializeOptions::json(), SerializeOptions::binary()] {
            let encoded = serialize(&original, &options).unwrap();
            assert_eq!(encoded.byte_length, encoded.data.len());
            assert!(encoded.verify().is_ok());
            assert_eq!(detect_format(&encoded.data), Some(options.format));

            let decoded = deserialize::<Message>(&encoded.data, None).unwrap();
            assert_eq!(decoded.format, options.format);
            assert_eq!(decoded.data, original);
        }
    }

    #[test]
    fn test_binary_is_smaller() {
        let original = message("size comparison");
        let json = serialize_json(&original).unwrap();
        let binary = serialize_binary(&original).unwrap();
        assert!(binary.byte_length < json.byte_length);
    }

    #[test]
    fn test_estimate_matches_output() {
        let original = message("estimate me");
        for format in [SerializationFormat::Json, SerializationFormat::Binary] {
            let encoded = serialize(&original, &SerializeOptions { format, ..SerializeOptions::default() }).unwrap();
            assert_eq!(estimate_size(&original, format).unwrap(), encoded.byte_length);
        }
    }

    #[test]
    fn test_compressed_binary_roundtrip() {
        let original = message(&"compressible ".repeat(500));
        let options = SerializeOptions {
            compression: Some(CompressionKind::Zstd),
            ..SerializeOptions::binary()
        };
        let encoded = serialize(&original, &options).unwrap();
        let plain = serialize_binary(&original).unwrap();
        assert!(encoded.byte_length < plain.byte_length);
        assert_eq!(deserialize::<Message>(&encoded.data, None).unwrap().data, original);
    }

    #[test]
    fn test_json_ignores_compression() {
        let original = message(&"compressible ".repeat(500));
        let options = SerializeOptions {
            compression: Some(CompressionKind::Lz4),
            ..SerializeOptions::json()
        };
        let encoded = serialize(&original, &options).unwrap();
        assert_eq!(detect_format(&encoded.data), Some(SerializationFormat::Json));
    }

    #[test]
    fn test_size_limit() {
        let options = SerializeOptions {
            max_message_size: 64,
            ..SerializeOptions::json()
        };
        let err = serialize(&message("far too long for sixty-four bytes"), &options).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Size);
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(b"  \n{\"a\":1}"), Some(SerializationFormat::Json));
        assert_eq!(detect_format(b"[]"), Some(SerializationFormat::Json));
        assert_eq!(detect_format(b"\xEF\xBB\xBF{}"), Some(SerializationFormat::Json));
        assert_eq!(detect_format(&[0x93, b'S']), Some(SerializationFormat::Binary));
        assert_eq!(detect_format(b"hello"), None);
        assert_eq!(detect_format(b""), None);
        assert_eq!(detect_format(b"   "), None);
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        let err = deserialize::<Message>(b"{\"type\":\"chat\"", None).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Format);

        let err = deserialize::<Message>(b"{\"type\":\"chat\"}", None).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Schema);

        let err = deserialize::<Message>(b"plain text", None).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Format);

        assert!(deserialize::<Message>(b"", None).is_err());
    }

    #[test]
    fn test_unknown_enum_value_rejected() {
        let encoded = serialize_json(&message("hi")).unwrap();
        let text = String::from_utf8(encoded.data).unwrap().replace("\"direct\"", "\"broadcast\"");
        let err = deserialize::<Message>(text.as_bytes(), None).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Schema);
    }

    #[test]
    fn test_chunk_frames_are_not_messages() {
        let chunk = create_file_chunk("file-1", 0, vec![1, 2, 3], None, true);
        let encoded = serialize_binary(&chunk).unwrap();
        assert!(deserialize::<Message>(&encoded.data, None).is_err());
        let decoded = deserialize::<FileChunk>(&encoded.data, None).unwrap();
        assert_eq!(decoded.data, chunk);
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let encoded = serialize_binary(&message("hi")).unwrap();
        let mut tampered = encoded.data.clone();
        tampered[5] = FrameKind::Event.as_byte();
        assert!(deserialize::<Message>(&tampered, None).is_err());
    }

    #[test]
    fn test_batch_roundtrip_preserves_order() {
        let batch: Vec<Message> = (0..5).map(|i| message(&format!("item {i}"))).collect();
        for options in [SerializeOptions::json(), SerializeOptions::binary()] {
            let encoded = serialize_batch(&batch, &options).unwrap();
            let decoded = deserialize_batch::<Message>(&encoded.data, None).unwrap();
            assert_eq!(decoded.data, batch);
        }
    }

    #[test]
    fn test_empty_batch() {
        let encoded = serialize_batch::<Message>(&[], &SerializeOptions::binary()).unwrap();
        let decoded = deserialize_batch::<Message>(&encoded.data, None).unwrap();
        assert!(decoded.data.is_empty());
    }

    #[test]
    fn test_truncated_batch_fails_whole() {
        let batch: Vec<Message> = (0..3).map(|i| message(&format!("item {i}"))).collect();
        let encoded = serialize_batch(&batch, &SerializeOptions::binary()).unwrap();
        for cut in [1, 5, encoded.data.len() / 2, encoded.data.len() - 1] {
            assert!(deserialize_batch::<Message>(&encoded.data[..cut], None).is_err());
        }

        let json = serialize_batch(&batch, &SerializeOptions::json()).unwrap();
        assert!(deserialize_batch::<Message>(&json.data[..json.data.len() - 1], None).is_err());
    }

    #[test]
    fn test_batch_count_larger_than_payload() {
        let mut payload = Vec::new();
        payload.put_u32(u32::MAX);
        let bytes = Frame::new(FrameKind::Batch, payload).to_bytes().unwrap();
        assert!(deserialize_batch::<Message>(&bytes, None).is_err());
    }
}
