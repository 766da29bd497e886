//! Example: the two wire encodings side by side
//!
//! Builds a few messages, encodes each as JSON and as a binary frame (plain and
//! compressed), validates them and decodes them back with format detection.
//!
//! Run with: `cargo run --example serialization_formats`

#![allow(clippy::uninlined_format_args)]

use sillychat_protocol::config::ProtocolConfig;
use sillychat_protocol::core::serialization::{
    deserialize, detect_format, serialize, serialize_batch, SerializationFormat, SerializeOptions,
};
use sillychat_protocol::protocol::factory::{
    create_chat_command, create_direct_target, create_guest_auth, create_human_sender,
    create_owner_auth, create_text_message, create_user_join_event,
};
use sillychat_protocol::protocol::message::{get_message_preview, Message};
use sillychat_protocol::protocol::validation::validate_message;
use sillychat_protocol::utils::compression::CompressionKind;
use sillychat_protocol::utils::logging::init_logging;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ProtocolConfig::from_env()?;
    init_logging(&config.logging)?;

    println!("=== SillyChat Wire Formats ===\n");

    let sender = create_human_sender("u1", "d1", Some("User One"));
    let messages: Vec<Message> = vec![
        create_text_message(
            sender.clone(),
            create_direct_target("c1"),
            &"Hello, World! ".repeat(40),
            create_guest_auth(None),
            None,
        )
        .into(),
        create_chat_command("agent-1", "Summarize this channel", sender, create_owner_auth(None, None), vec![])
            .into(),
        create_user_join_event("u2", "c1", Some("User Two")).into(),
    ];

    let variants = [
        ("JSON", SerializeOptions::json()),
        ("Binary", SerializeOptions::binary()),
        (
            "Binary+zstd",
            SerializeOptions {
                compression: Some(CompressionKind::Zstd),
                compression_threshold_bytes: 64,
                ..SerializeOptions::binary()
            },
        ),
    ];

    for message in &messages {
        println!("{} {}: {}", message.message_type(), message.id(), get_message_preview(message, Some(32)));

        let report = validate_message(message, &config.validation.to_options());
        println!("   valid: {} ({} warnings)", report.valid, report.warnings.len());

        for (label, options) in &variants {
            let encoded = serialize(message, options)?;
            let decoded = deserialize::<Message>(&encoded.data, None)?;
            println!(
                "   {:<12} {:>6} bytes  detected as {:<6}  checksum {}…  roundtrip {}",
                label,
                encoded.byte_length,
                decoded.format.name(),
                &encoded.checksum[..12],
                if decoded.data == *message { "ok" } else { "MISMATCH" }
            );
        }
        println!();
    }

    let batch = serialize_batch(&messages, &SerializeOptions::binary())?;
    println!(
        "Batch of {} messages: {} bytes, detected as {:?}",
        messages.len(),
        batch.byte_length,
        detect_format(&batch.data).map(SerializationFormat::name)
    );

    let json = serialize(&messages[2], &SerializeOptions::json())?;
    println!("\nJSON event:\n{}", String::from_utf8_lossy(&json.data));

    Ok(())
}
