//! Integration tests for the two wire encodings
//!
//! Tests the MultiFormat trait implementation and the codec entry points for
//! JSON (human-readable) and framed MessagePack (binary).

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::uninlined_format_args,
    clippy::expect_fun_call
)]

use serde_json::json;
use sillychat_protocol::core::frame::{Frame, FrameKind, HEADER_SIZE};
use sillychat_protocol::core::serialization::{
    deserialize, detect_format, estimate_size, serialize, serialize_binary, serialize_json,
    MultiFormat, SerializationFormat, SerializeOptions,
};
use sillychat_protocol::protocol::factory::*;
use sillychat_protocol::protocol::message::{FileChunk, Message};
use sillychat_protocol::protocol::types::{JsonMap, SystemEventType};
use sillychat_protocol::utils::compression::CompressionKind;

fn chat() -> Message {
    create_text_message(
        create_human_sender("u1", "d1", Some("User One")),
        create_direct_target("c1"),
        "Hello, JSON!",
        create_guest_auth(None),
        None,
    )
    .into()
}

#[test]
fn test_json_serialization() {
    let message = chat();

    let bytes = message
        .serialize_format(SerializationFormat::Json)
        .expect("Failed to serialize");

    let json_str = std::str::from_utf8(&bytes).expect("Invalid UTF-8");
    assert!(json_str.contains("Hello, JSON!"));
    assert!(json_str.contains("\"userId\":\"u1\""));
    assert!(!json_str.contains("null"), "absent optionals must be omitted: {}", json_str);

    let recovered = Message::deserialize_format(&bytes, SerializationFormat::Json)
        .expect("Failed to deserialize");
    assert_eq!(message, recovered);
}

#[test]
fn test_binary_serialization() {
    let message = chat();

    let bytes = message
        .serialize_format(SerializationFormat::Binary)
        .expect("Failed to serialize");
    assert_eq!(&bytes[..4], &[0x93, b'S', b'C', b'P']);
    assert_eq!(bytes[5], FrameKind::Chat.as_byte());

    let recovered = Message::deserialize_format(&bytes, SerializationFormat::Binary)
        .expect("Failed to deserialize");
    assert_eq!(message, recovered);
}

#[test]
fn test_binary_payload_uses_field_names() {
    let bytes = serialize_binary(&chat()).unwrap().data;
    let frame = Frame::from_bytes(&bytes).unwrap();
    let value: serde_json::Value = rmp_serde::from_slice(&frame.payload).unwrap();
    assert_eq!(value["type"], "chat");
    assert_eq!(value["sender"]["deviceId"], "d1");
    assert_eq!(value["content"]["data"], "Hello, JSON!");
}

#[test]
fn test_every_variant_in_both_formats() {
    let sender = create_human_sender("u1", "d1", None);
    let messages: Vec<Message> = vec![
        chat(),
        create_skill_command(
            "agent-1",
            "web-search",
            "query",
            JsonMap::from_iter([("q".to_string(), json!("rust serde"))]),
            sender.clone(),
            create_owner_auth(Some("sig"), Some("tok")),
        )
        .into(),
        create_sync_completed_event("d1", "full", 42).into(),
        create_error_event("3003", "Insufficient level", Some("msg-original")).into(),
        create_file_transfer(FileTransferOptions::new(
            "notes.txt",
            12_345,
            "text/plain",
            sender,
            create_group_target("g1"),
            create_admin_auth(None, None),
        ))
        .into(),
    ];

    for message in &messages {
        for format in [SerializationFormat::Json, SerializationFormat::Binary] {
            let bytes = message.serialize_format(format).unwrap();
            assert_eq!(detect_format(&bytes), Some(format));
            let back = Message::deserialize_format(&bytes, format).unwrap();
            assert_eq!(&back, message, "{:?} round trip of {}", format, message.message_type());
        }
    }
}

#[test]
fn test_extensions_and_expiry_roundtrip() {
    let mut options = ChatMessageOptions::new(
        create_human_sender("u1", "d1", None),
        create_direct_target("c1"),
        create_text_content("with extras", None),
        create_guest_auth(None),
    );
    options.envelope.expires_at = Some(u64::MAX - 1);
    options.envelope.extensions = Some(JsonMap::from_iter([
        ("nested".to_string(), json!({"a": [1, 2.5, "x", null, true]})),
        ("big".to_string(), json!(u64::MAX)),
        ("negative".to_string(), json!(-17)),
    ]));
    let message = Message::Chat(create_chat_message(options));

    for options in [SerializeOptions::json(), SerializeOptions::binary()] {
        let encoded = serialize(&message, &options).unwrap();
        let decoded = deserialize::<Message>(&encoded.data, Some(options.format)).unwrap();
        assert_eq!(decoded.data, message);
    }
}

#[test]
fn test_file_chunk_encodings() {
    let chunk = create_file_chunk("file-abc", 7, vec![0, 1, 2, 253, 254, 255], None, false);

    let json = serialize_json(&chunk).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&json.data).unwrap();
    assert_eq!(value["data"], "AAEC/f7/");
    assert_eq!(value["chunkIndex"], 7);
    assert_eq!(value["isLast"], false);

    let binary = serialize_binary(&chunk).unwrap();
    assert_eq!(binary.data[5], FrameKind::Chunk.as_byte());

    for bytes in [&json.data, &binary.data] {
        let back = deserialize::<FileChunk>(bytes, None).unwrap().data;
        assert_eq!(back, chunk);
        assert!(back.verify().is_ok());
    }
}

#[test]
fn test_bad_base64_chunk_rejected() {
    let text = r#"{"fileId":"f","chunkIndex":0,"data":"***","checksum":"00","isLast":true}"#;
    assert!(deserialize::<FileChunk>(text.as_bytes(), None).is_err());
}

#[test]
fn test_checksum_covers_encoded_bytes() {
    let encoded = serialize_json(&chat()).unwrap();
    assert_eq!(encoded.checksum.len(), 64);
    assert!(encoded.verify().is_ok());

    let mut tampered = encoded.clone();
    tampered.data[10] ^= 0x01;
    assert!(tampered.verify().is_err());
}

#[test]
fn test_estimate_size_matches() {
    let message = chat();
    let json = serialize_json(&message).unwrap();
    let binary = serialize_binary(&message).unwrap();
    assert_eq!(estimate_size(&message, SerializationFormat::Json).unwrap(), json.byte_length);
    assert_eq!(estimate_size(&message, SerializationFormat::Binary).unwrap(), binary.byte_length);
    assert!(binary.byte_length > HEADER_SIZE);
}

#[test]
fn test_compression_kinds() {
    let message: Message = create_text_message(
        create_human_sender("u1", "d1", None),
        create_direct_target("c1"),
        &"the same words again and again ".repeat(200),
        create_guest_auth(None),
        None,
    )
    .into();
    let plain = serialize_binary(&message).unwrap();

    for kind in [CompressionKind::Lz4, CompressionKind::Zstd] {
        let options = SerializeOptions {
            compression: Some(kind),
            ..SerializeOptions::binary()
        };
        let encoded = serialize(&message, &options).unwrap();
        assert!(encoded.byte_length < plain.byte_length, "{} did not shrink", kind.name());
        assert_ne!(encoded.data[6], 0, "compression flag should be set");
        assert_eq!(deserialize::<Message>(&encoded.data, None).unwrap().data, message);
    }
}

#[test]
fn test_small_payload_skips_compression() {
    let options = SerializeOptions {
        compression: Some(CompressionKind::Zstd),
        compression_threshold_bytes: 4096,
        ..SerializeOptions::binary()
    };
    let encoded = serialize(&chat(), &options).unwrap();
    assert_eq!(encoded.data[6], 0);
}

#[test]
fn test_event_type_names_on_the_wire() {
    let event: Message = create_agent_online_event("agent-1", None).into();
    let json = serialize_json(&event).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&json.data).unwrap();
    assert_eq!(value["type"], "event");
    assert_eq!(value["eventType"], SystemEventType::AgentOnline.as_str());
    assert_eq!(value["eventType"], "agent_online");
}
