#![no_main]

use libfuzzer_sys::fuzz_target;
use sillychat_protocol::utils::compression::{compress, decompress, CompressionKind};

fuzz_target!(|data: &[u8]| {
    for kind in [CompressionKind::Lz4, CompressionKind::Zstd] {
        if let Ok(compressed) = compress(data, kind) {
            assert_eq!(decompress(&compressed, kind).ok().as_deref(), Some(data));
        }

        // Raw input exercises the decompression ceiling with malformed data
        let _ = decompress(data, kind);
    }
});
