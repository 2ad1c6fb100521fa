#![no_main]

use formula_xls_records::biff::{registry::registered_record_ids, CodecContext, Record};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First two bytes pick the code page so string records see more than cp1252.
    let (codepage, payload) = match data {
        [a, b, rest @ ..] => (u16::from_le_bytes([*a, *b]), rest),
        _ => return,
    };
    let ctx = CodecContext::with_codepage(codepage);

    for record_id in registered_record_ids() {
        if let Ok(record) = Record::decode(record_id, payload, &ctx) {
            assert_eq!(record.encode(), payload);
            let _ = record.warnings();
        }
    }
});
