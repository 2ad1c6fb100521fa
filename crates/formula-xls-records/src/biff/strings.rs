//! BIFF8 string encodings.
//!
//! BIFF8 stores text either "compressed" (one byte per character in the workbook code page) or as
//! UTF-16LE. The `XLUnicodeString` layout [MS-XLS 2.5.294] prefixes the characters with a 16-bit
//! character count and an option-flags byte whose low bit selects the wide form.

use std::collections::BTreeSet;
use std::sync::{Mutex, OnceLock};

use encoding_rs::{
    EncoderResult, Encoding, BIG5, EUC_KR, GBK, SHIFT_JIS, UTF_8, WINDOWS_1250, WINDOWS_1251,
    WINDOWS_1252, WINDOWS_1253, WINDOWS_1254, WINDOWS_1255, WINDOWS_1256, WINDOWS_1257,
    WINDOWS_1258, WINDOWS_874,
};

use crate::error::RecordError;

// XLUnicodeString option flags. See [MS-XLS] 2.5.294 and 2.5.293.
pub(crate) const STR_FLAG_HIGH_BYTE: u8 = 0x01;
pub(crate) const STR_FLAG_EXT: u8 = 0x04;
pub(crate) const STR_FLAG_RICH_TEXT: u8 = 0x08;

/// Code page used when a workbook does not say otherwise (Windows Latin 1).
pub const DEFAULT_CODEPAGE: u16 = 1252;

/// Maximum number of UTF-16 code units a BIFF8 string can declare.
pub const MAX_STRING_UNITS: usize = u16::MAX as usize;

pub fn encoding_for_codepage(codepage: u16) -> Option<&'static Encoding> {
    Some(match codepage as u32 {
        874 => WINDOWS_874,
        932 => SHIFT_JIS,
        936 => GBK,
        949 => EUC_KR,
        950 => BIG5,
        1250 => WINDOWS_1250,
        1251 => WINDOWS_1251,
        1252 => WINDOWS_1252,
        1253 => WINDOWS_1253,
        1254 => WINDOWS_1254,
        1255 => WINDOWS_1255,
        1256 => WINDOWS_1256,
        1257 => WINDOWS_1257,
        1258 => WINDOWS_1258,
        65001 => UTF_8,
        _ => return None,
    })
}

/// Decode 8-bit text stored in the workbook code page.
pub fn decode_ansi(codepage: u16, bytes: &[u8]) -> String {
    if let Some(encoding) = encoding_for_codepage(codepage) {
        let (cow, _) = encoding.decode_without_bom_handling(bytes);
        return cow.into_owned();
    }

    warn_unsupported_codepage(codepage);

    // Lossless byte-to-Unicode mapping (ISO-8859-1-ish): keeps ASCII intact even when the code
    // page isn't supported by `encoding_rs`.
    bytes.iter().copied().map(char::from).collect()
}

/// Encode text into the workbook code page, substituting `?` for unmappable characters.
///
/// Returns the bytes and whether any substitution happened.
pub fn encode_ansi(codepage: u16, text: &str) -> (Vec<u8>, bool) {
    let Some(encoding) = encoding_for_codepage(codepage) else {
        warn_unsupported_codepage(codepage);
        let mut lossy = false;
        let bytes = text
            .chars()
            .map(|ch| {
                u8::try_from(u32::from(ch)).unwrap_or_else(|_| {
                    lossy = true;
                    b'?'
                })
            })
            .collect();
        return (bytes, lossy);
    };

    let mut encoder = encoding.new_encoder();
    let mut out = Vec::with_capacity(text.len());
    let mut src = text;
    let mut lossy = false;
    loop {
        let capacity = encoder
            .max_buffer_length_from_utf8_without_replacement(src.len())
            .unwrap_or(src.len().saturating_mul(4))
            .max(16);
        let mut buf = vec![0u8; capacity];
        let (result, read, written) = encoder.encode_from_utf8_without_replacement(src, &mut buf, true);
        out.extend_from_slice(&buf[..written]);
        src = &src[read..];
        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::OutputFull => continue,
            EncoderResult::Unmappable(_) => {
                lossy = true;
                out.push(b'?');
            }
        }
    }
    (out, lossy)
}

/// Encode `text` as one code-page byte per UTF-16 code unit, or `None` if that is impossible.
///
/// This is the test used to decide whether a string can use the compressed BIFF8 form.
pub fn encode_ansi_exact(codepage: u16, text: &str) -> Option<Vec<u8>> {
    let (bytes, lossy) = encode_ansi(codepage, text);
    if lossy || bytes.len() != text.encode_utf16().count() {
        return None;
    }
    // Multi-byte code pages can round-trip a string whose byte count happens to match; only accept
    // the compressed form when decoding gives the original text back.
    (decode_ansi(codepage, &bytes) == text).then_some(bytes)
}

fn warn_unsupported_codepage(codepage: u16) {
    static WARNED: OnceLock<Mutex<BTreeSet<u16>>> = OnceLock::new();

    let warned = WARNED.get_or_init(|| Mutex::new(BTreeSet::new()));
    let mut warned = match warned.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    if warned.insert(codepage) {
        log::warn!(
            "unsupported BIFF CODEPAGE {codepage}; using lossless byte-to-Unicode mapping for 8-bit strings"
        );
    }
}

fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

fn encode_utf16le(text: &str, out: &mut Vec<u8>) {
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
}

/// A decoded BIFF8 string together with the encoding it was (or will be) stored in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnicodeString {
    text: String,
    wide: bool,
}

impl UnicodeString {
    /// Build a string choosing the narrowest encoding that represents `text` in `codepage`.
    pub fn new(text: impl Into<String>, codepage: u16) -> Result<Self, RecordError> {
        let text = text.into();
        let units = text.encode_utf16().count();
        if units > MAX_STRING_UNITS {
            return Err(RecordError::StringTooLong { len: units });
        }
        let wide = encode_ansi_exact(codepage, &text).is_none();
        Ok(Self { text, wide })
    }

    /// A string read from a record. Compressed text is only kept compressed when it maps back to
    /// exactly one code page byte per UTF-16 unit; multi-byte code pages otherwise switch it to the
    /// wide form so the character count stays consistent on re-encode.
    pub(crate) fn from_decoded(text: String, wide: bool, codepage: u16) -> Self {
        let wide = wide || encode_ansi_exact(codepage, &text).is_none();
        Self { text, wide }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the characters are stored as UTF-16LE (`fHighByte`).
    pub fn is_wide(&self) -> bool {
        self.wide
    }

    /// Number of UTF-16 code units (the BIFF8 character count).
    pub fn char_count(&self) -> usize {
        self.text.encode_utf16().count()
    }

    /// Size in bytes of the character data alone.
    pub fn char_data_len(&self, codepage: u16) -> usize {
        if self.wide {
            self.char_count() * 2
        } else {
            self.narrow_bytes(codepage).len()
        }
    }

    pub fn into_string(self) -> String {
        self.text
    }

    fn narrow_bytes(&self, codepage: u16) -> Vec<u8> {
        // `wide == false` is only ever set for text with one code page byte per UTF-16 unit.
        encode_ansi(codepage, &self.text).0
    }

    /// Append the flags byte followed by the character data.
    pub(crate) fn write_flags_and_chars(&self, codepage: u16, out: &mut Vec<u8>) {
        if self.wide {
            out.push(STR_FLAG_HIGH_BYTE);
            encode_utf16le(&self.text, out);
        } else {
            out.push(0);
            out.extend_from_slice(&self.narrow_bytes(codepage));
        }
    }

    /// Append the full `XLUnicodeString` layout.
    pub fn write_to(&self, codepage: u16, out: &mut Vec<u8>) {
        // `new`/decoding keep the count within u16.
        out.extend_from_slice(&(self.char_count() as u16).to_le_bytes());
        self.write_flags_and_chars(codepage, out);
    }

    /// Encoded size of the full `XLUnicodeString` layout.
    pub fn encoded_len(&self, codepage: u16) -> usize {
        3 + self.char_data_len(codepage)
    }
}

/// Decode an `XLUnicodeString` starting at `start`.
///
/// Returns the string and the number of bytes consumed (header, characters and any rich-text or
/// extended-string payload that follows the characters).
pub fn decode_unicode_string(
    input: &[u8],
    start: usize,
    codepage: u16,
) -> Result<(UnicodeString, usize), RecordError> {
    let input = input.get(start..).unwrap_or_default();
    let Some(header) = input.get(..3) else {
        return Err(truncated_string(3, input.len()));
    };
    let cch = u16::from_le_bytes([header[0], header[1]]) as usize;
    let flags = header[2];
    decode_string_payload(input, cch, flags, 3, codepage)
}

/// Encode `text` as an `XLUnicodeString`, choosing the compressed form whenever possible.
pub fn encode_unicode_string(text: &str, codepage: u16) -> Result<Vec<u8>, RecordError> {
    let value = UnicodeString::new(text, codepage)?;
    let mut out = Vec::with_capacity(value.encoded_len(codepage));
    value.write_to(codepage, &mut out);
    Ok(out)
}

fn truncated_string(needed: usize, actual: usize) -> RecordError {
    RecordError::MalformedRecord {
        record_id: 0,
        reason: format!("unexpected end of string: need {needed} bytes, got {actual}"),
    }
}

fn decode_string_payload(
    input: &[u8],
    cch: usize,
    flags: u8,
    mut offset: usize,
    codepage: u16,
) -> Result<(UnicodeString, usize), RecordError> {
    let read_field = |offset: usize, len: usize| -> Result<&[u8], RecordError> {
        let end = offset + len;
        input
            .get(offset..end)
            .ok_or_else(|| truncated_string(end, input.len()))
    };

    let richtext_runs = if flags & STR_FLAG_RICH_TEXT != 0 {
        let bytes = read_field(offset, 2)?;
        offset += 2;
        u16::from_le_bytes([bytes[0], bytes[1]]) as usize
    } else {
        0
    };

    let ext_size = if flags & STR_FLAG_EXT != 0 {
        let bytes = read_field(offset, 4)?;
        offset += 4;
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize
    } else {
        0
    };

    let wide = (flags & STR_FLAG_HIGH_BYTE) != 0;
    let char_bytes = if wide { cch * 2 } else { cch };
    let chars = read_field(offset, char_bytes)?;
    offset += char_bytes;

    let text = if wide {
        decode_utf16le(chars)
    } else {
        decode_ansi(codepage, chars)
    };

    let end = offset
        .checked_add(richtext_runs * 4)
        .and_then(|v| v.checked_add(ext_size))
        .ok_or_else(|| truncated_string(usize::MAX, input.len()))?;
    if input.len() < end {
        return Err(truncated_string(end, input.len()));
    }

    Ok((UnicodeString::from_decoded(text, wide, codepage), end))
}

/// Decode the legacy byte-string layout: `[cch: u16][code page bytes]` with no flags byte.
pub fn decode_byte_string(
    input: &[u8],
    start: usize,
    codepage: u16,
) -> Result<(String, usize), RecordError> {
    let input = input.get(start..).unwrap_or_default();
    let Some(header) = input.get(..2) else {
        return Err(truncated_string(2, input.len()));
    };
    let cch = u16::from_le_bytes([header[0], header[1]]) as usize;
    let end = 2 + cch;
    let bytes = input
        .get(2..end)
        .ok_or_else(|| truncated_string(end, input.len()))?;
    Ok((decode_ansi(codepage, bytes), end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_ansi_falls_back_to_lossless_mapping_for_unknown_codepage() {
        let bytes = [0x41u8, 0x80, 0xFF];
        let expected: String = bytes.iter().copied().map(char::from).collect();
        assert_eq!(decode_ansi(9999, &bytes), expected);
    }

    #[test]
    fn decode_ansi_uses_codepage() {
        // In Windows-1251, 0xC0 is Cyrillic 'А' (U+0410).
        assert_eq!(decode_ansi(1251, &[0xC0]), "А");
        // In Windows-1252, 0x80 is the euro sign.
        assert_eq!(decode_ansi(1252, &[0x80]), "€");
    }

    #[test]
    fn encode_ansi_substitutes_unmappable_characters() {
        let (bytes, lossy) = encode_ansi(1252, "a€✓b");
        assert_eq!(bytes, vec![b'a', 0x80, b'?', b'b']);
        assert!(lossy);

        let (bytes, lossy) = encode_ansi(9999, "aé✓");
        assert_eq!(bytes, vec![b'a', 0xE9, b'?']);
        assert!(lossy);
    }

    #[test]
    fn encode_ansi_exact_rejects_multibyte_output() {
        // "あ" needs two bytes in Shift-JIS, so it cannot use the compressed form.
        assert_eq!(encode_ansi_exact(932, "あ"), None);
        assert_eq!(encode_ansi_exact(932, "abc"), Some(b"abc".to_vec()));
    }

    #[test]
    fn encodes_codepage_text_compressed() {
        let bytes = encode_unicode_string("Hello", DEFAULT_CODEPAGE).expect("encode");
        assert_eq!(bytes, [&5u16.to_le_bytes()[..], &[0x00], b"Hello"].concat());
    }

    #[test]
    fn encodes_non_codepage_text_wide() {
        let bytes = encode_unicode_string("日本", DEFAULT_CODEPAGE).expect("encode");
        assert_eq!(
            bytes,
            vec![0x02, 0x00, STR_FLAG_HIGH_BYTE, 0xE5, 0x65, 0x2C, 0x67]
        );
    }

    #[test]
    fn wide_flag_is_per_codepage() {
        // Cyrillic fits Windows-1251 but not Windows-1252.
        assert!(!UnicodeString::new("Привет", 1251).unwrap().is_wide());
        assert!(UnicodeString::new("Привет", 1252).unwrap().is_wide());
    }

    #[test]
    fn rejects_strings_longer_than_u16_units() {
        let text = "a".repeat(MAX_STRING_UNITS + 1);
        assert_eq!(
            encode_unicode_string(&text, DEFAULT_CODEPAGE),
            Err(RecordError::StringTooLong {
                len: MAX_STRING_UNITS + 1
            })
        );
    }

    #[test]
    fn parses_unicode_string_compressed() {
        let mut input = vec![0xEE]; // leading byte before `start`
        input.extend_from_slice(&5u16.to_le_bytes());
        input.push(0x00);
        input.extend_from_slice(b"Hello");
        let (s, consumed) = decode_unicode_string(&input, 1, DEFAULT_CODEPAGE).expect("parse");
        assert_eq!(consumed, input.len() - 1);
        assert_eq!(s.text(), "Hello");
        assert!(!s.is_wide());
    }

    #[test]
    fn compressed_multibyte_text_decodes_as_wide() {
        // Two Shift-JIS bytes, one UTF-16 unit: the compressed form can't describe it.
        let input = [2, 0, 0, 0x82, 0xA0];
        let (s, consumed) = decode_unicode_string(&input, 0, 932).expect("parse");
        assert_eq!(consumed, input.len());
        assert_eq!(s.text(), "あ");
        assert!(s.is_wide());

        let mut out = Vec::new();
        s.write_to(932, &mut out);
        assert_eq!(out, vec![1, 0, STR_FLAG_HIGH_BYTE, 0x42, 0x30]);
        assert_eq!(out.len(), s.encoded_len(932));

        // Single-byte UTF-8 text stays compressed.
        let (s, _) = decode_unicode_string(&[2, 0, 0, b'o', b'k'], 0, 65001).expect("parse");
        assert!(!s.is_wide());
    }

    #[test]
    fn parses_unicode_string_wide() {
        let mut input = Vec::new();
        input.extend_from_slice(&2u16.to_le_bytes());
        input.push(STR_FLAG_HIGH_BYTE);
        input.extend_from_slice(&[b'H', 0x00, b'i', 0x00]);
        let (s, consumed) = decode_unicode_string(&input, 0, DEFAULT_CODEPAGE).expect("parse");
        assert_eq!(consumed, input.len());
        assert_eq!(s.text(), "Hi");
        assert!(s.is_wide());
    }

    #[test]
    fn parses_unicode_string_with_richtext_and_ext() {
        let mut input = Vec::new();
        input.extend_from_slice(&3u16.to_le_bytes());
        input.push(STR_FLAG_RICH_TEXT | STR_FLAG_EXT);
        input.extend_from_slice(&1u16.to_le_bytes()); // cRun
        input.extend_from_slice(&2u32.to_le_bytes()); // cbExtRst
        input.extend_from_slice(b"abc");
        input.extend_from_slice(&[0u8; 4]); // rich text runs
        input.extend_from_slice(&[0u8; 2]); // ext payload

        let (s, consumed) = decode_unicode_string(&input, 0, DEFAULT_CODEPAGE).expect("parse");
        assert_eq!(consumed, input.len());
        assert_eq!(s.text(), "abc");
    }

    #[test]
    fn errors_on_truncated_unicode_string_data() {
        let mut input = Vec::new();
        input.extend_from_slice(&5u16.to_le_bytes());
        input.push(0x00);
        input.extend_from_slice(b"Hel");
        let err = decode_unicode_string(&input, 0, DEFAULT_CODEPAGE).unwrap_err();
        assert!(err.to_string().contains("unexpected end of string"), "err={err}");
    }

    #[test]
    fn errors_on_missing_header() {
        assert!(decode_unicode_string(&[0x01, 0x00], 0, DEFAULT_CODEPAGE).is_err());
        assert!(decode_unicode_string(&[0x01, 0x00, 0x00], 5, DEFAULT_CODEPAGE).is_err());
    }

    #[test]
    fn decodes_legacy_byte_string() {
        let input = [3u8, 0, b'a', b'b', b'c', 0xFF];
        let (s, consumed) = decode_byte_string(&input, 0, DEFAULT_CODEPAGE).expect("parse");
        assert_eq!(s, "abc");
        assert_eq!(consumed, 5);
        assert!(decode_byte_string(&[4u8, 0, b'a'], 0, DEFAULT_CODEPAGE).is_err());
    }

    #[test]
    fn encoded_len_matches_written_bytes() {
        for text in ["", "plain", "wide ✓", "€uro"] {
            let value = UnicodeString::new(text, DEFAULT_CODEPAGE).unwrap();
            let mut out = Vec::new();
            value.write_to(DEFAULT_CODEPAGE, &mut out);
            assert_eq!(out.len(), value.encoded_len(DEFAULT_CODEPAGE), "text={text:?}");
        }
    }
}
