#![no_main]

use formula_xls_records::biff::{decode_stream, DecodePolicy, StreamOptions};
use libfuzzer_sys::fuzz_target;

/// Streams larger than this mostly spend time in memcpy.
const MAX_INPUT_BYTES: usize = 256 * 1024;

fuzz_target!(|data: &[u8]| {
    let data = &data[..data.len().min(MAX_INPUT_BYTES)];

    for policy in [DecodePolicy::Abort, DecodePolicy::SkipAndReport] {
        let options = StreamOptions {
            policy,
            ..StreamOptions::default()
        };
        if let Ok(decoded) = decode_stream(data, &options) {
            assert_eq!(decoded.encode(), data);
        }
    }
});
