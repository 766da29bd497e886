#![no_main]

use libfuzzer_sys::fuzz_target;
use sillychat_protocol::core::serialization::{deserialize, deserialize_batch};
use sillychat_protocol::protocol::message::{FileChunk, Message};
use sillychat_protocol::protocol::validation::{validate_message, ValidationOptions};

fuzz_target!(|data: &[u8]| {
    // Anything that decodes must also validate without panicking
    if let Ok(decoded) = deserialize::<Message>(data, None) {
        let _ = validate_message(&decoded.data, &ValidationOptions::default());
    }
    let _ = deserialize::<FileChunk>(data, None);
    let _ = deserialize_batch::<Message>(data, None);
});
