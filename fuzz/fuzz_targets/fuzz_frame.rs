#![no_main]

use libfuzzer_sys::fuzz_target;
use sillychat_protocol::core::frame::Frame;

fuzz_target!(|data: &[u8]| {
    // Header parsing and decompression must respect their size limits
    if let Ok(frame) = Frame::from_bytes(data) {
        let _ = frame.into_payload();
    }
});
