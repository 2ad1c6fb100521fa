//! LABEL: a cell holding a string constant.

use crate::error::RecordError;

use super::cell::{CellAddress, CellHeader, CellRecord, CELL_HEADER_LEN};
use super::codec::{ensure_len, ensure_record_id, read_u16, CodecContext, RecordCodec};
use super::strings::{decode_byte_string, decode_unicode_string, encode_ansi_exact, UnicodeString};

pub const RECORD_LABEL: u16 = 0x0204;

/// How the string of a LABEL record is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelLayout {
    /// BIFF8 `XLUnicodeString`: `[cch: u16][flags: u8][chars]`.
    Unicode,
    /// Pre-BIFF8 byte string: `[cb: u16][code page bytes]`, no flags byte.
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRecord {
    header: CellHeader,
    value: UnicodeString,
    layout: LabelLayout,
    codepage: u16,
    data: Vec<u8>,
}

impl LabelRecord {
    /// Build a BIFF8 label, choosing the compressed form when `text` fits the code page.
    pub fn new(
        address: CellAddress,
        xf: u16,
        text: &str,
        ctx: &CodecContext,
    ) -> Result<Self, RecordError> {
        let mut record = Self {
            header: CellHeader { address, xf },
            value: UnicodeString::new(text, ctx.codepage)?,
            layout: LabelLayout::Unicode,
            codepage: ctx.codepage,
            data: Vec::new(),
        };
        record.rebuild();
        Ok(record)
    }

    pub fn text(&self) -> &str {
        self.value.text()
    }

    pub fn value(&self) -> &UnicodeString {
        &self.value
    }

    pub fn layout(&self) -> LabelLayout {
        self.layout
    }

    /// Replace the string.
    ///
    /// The wide flag is recomputed from the new text. A legacy-layout label whose new text cannot
    /// be stored as code page bytes is rewritten with the unicode layout.
    pub fn set_text(&mut self, text: &str) -> Result<(), RecordError> {
        let value = UnicodeString::new(text, self.codepage)?;
        if value.is_wide() {
            self.layout = LabelLayout::Unicode;
        }
        self.value = value;
        self.rebuild();
        Ok(())
    }

    fn rebuild(&mut self) {
        self.data.clear();
        self.header.write_to(&mut self.data);
        match self.layout {
            LabelLayout::Unicode => self.value.write_to(self.codepage, &mut self.data),
            LabelLayout::Legacy => match encode_ansi_exact(self.codepage, self.value.text()) {
                Some(bytes) => {
                    self.data
                        .extend_from_slice(&(bytes.len() as u16).to_le_bytes());
                    self.data.extend_from_slice(&bytes);
                }
                None => {
                    self.layout = LabelLayout::Unicode;
                    self.value.write_to(self.codepage, &mut self.data);
                }
            },
        }
    }
}

impl CellRecord for LabelRecord {
    fn address(&self) -> CellAddress {
        self.header.address
    }

    fn xf_index(&self) -> u16 {
        self.header.xf
    }

    fn set_xf_index(&mut self, xf: u16) {
        self.header.xf = xf;
        self.rebuild();
    }
}

impl RecordCodec for LabelRecord {
    fn decode(record_id: u16, data: &[u8], ctx: &CodecContext) -> Result<Self, RecordError> {
        ensure_record_id(RECORD_LABEL, record_id)?;
        ensure_len(record_id, data, CELL_HEADER_LEN + 2)?;
        let header = CellHeader::decode(record_id, data)?;
        let cch = read_u16(data, CELL_HEADER_LEN) as usize;

        // The legacy layout is exactly `cch` bytes after the count; every unicode layout is at
        // least one byte longer because of the flags byte.
        let (value, layout) = if data.len() == CELL_HEADER_LEN + 2 + cch {
            let (text, _) = decode_byte_string(data, CELL_HEADER_LEN, ctx.codepage)
                .map_err(|err| with_record_id(err, record_id))?;
            // Bytes that don't survive a round trip become wide; the record still re-encodes
            // from its original payload until mutated.
            let value = UnicodeString::from_decoded(text, false, ctx.codepage);
            (value, LabelLayout::Legacy)
        } else {
            let (value, _) = decode_unicode_string(data, CELL_HEADER_LEN, ctx.codepage)
                .map_err(|err| with_record_id(err, record_id))?;
            (value, LabelLayout::Unicode)
        };

        Ok(Self {
            header,
            value,
            layout,
            codepage: ctx.codepage,
            data: data.to_vec(),
        })
    }

    fn record_id(&self) -> u16 {
        RECORD_LABEL
    }

    fn payload(&self) -> &[u8] {
        &self.data
    }
}

fn with_record_id(err: RecordError, record_id: u16) -> RecordError {
    match err {
        RecordError::MalformedRecord { reason, .. } => {
            RecordError::MalformedRecord { record_id, reason }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biff::strings::STR_FLAG_HIGH_BYTE;

    fn header(row: u16, col: u16, xf: u16) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&row.to_le_bytes());
        out.extend_from_slice(&col.to_le_bytes());
        out.extend_from_slice(&xf.to_le_bytes());
        out
    }

    #[test]
    fn decodes_unicode_layout_compressed_and_wide() {
        let ctx = CodecContext::default();

        let mut data = header(1, 2, 3);
        data.extend_from_slice(&[5, 0, 0]);
        data.extend_from_slice(b"Hello");
        let label = LabelRecord::decode(RECORD_LABEL, &data, &ctx).expect("decode");
        assert_eq!(label.text(), "Hello");
        assert_eq!(label.layout(), LabelLayout::Unicode);
        assert!(!label.value().is_wide());
        assert_eq!(label.encode(), data);

        let mut data = header(1, 2, 3);
        data.extend_from_slice(&[1, 0, STR_FLAG_HIGH_BYTE, 0x13, 0x27]);
        let label = LabelRecord::decode(RECORD_LABEL, &data, &ctx).expect("decode");
        assert_eq!(label.text(), "✓");
        assert!(label.value().is_wide());
        assert_eq!(label.encode(), data);
    }

    #[test]
    fn decodes_legacy_layout_and_keeps_it_on_mutation() {
        let ctx = CodecContext::default();
        let mut data = header(0, 0, 0);
        data.extend_from_slice(&[3, 0]);
        data.extend_from_slice(b"abc");
        let mut label = LabelRecord::decode(RECORD_LABEL, &data, &ctx).expect("decode");
        assert_eq!(label.layout(), LabelLayout::Legacy);
        assert_eq!(label.text(), "abc");
        assert_eq!(label.encode(), data);

        label.set_text("café").expect("set");
        let mut expected = header(0, 0, 0);
        expected.extend_from_slice(&[4, 0, b'c', b'a', b'f', 0xE9]);
        assert_eq!(label.layout(), LabelLayout::Legacy);
        assert_eq!(label.encode(), expected);
    }

    #[test]
    fn legacy_layout_switches_to_unicode_for_wide_text() {
        let ctx = CodecContext::default();
        let mut data = header(0, 0, 0);
        data.extend_from_slice(&[1, 0, b'x']);
        let mut label = LabelRecord::decode(RECORD_LABEL, &data, &ctx).expect("decode");

        label.set_text("日").expect("set");
        let mut expected = header(0, 0, 0);
        expected.extend_from_slice(&[1, 0, STR_FLAG_HIGH_BYTE, 0xE5, 0x65]);
        assert_eq!(label.layout(), LabelLayout::Unicode);
        assert_eq!(label.encode(), expected);
    }

    #[test]
    fn compressed_multibyte_text_survives_xf_change() {
        // "あ" stored compressed as two Shift-JIS bytes.
        let ctx = CodecContext::with_codepage(932);
        let mut data = header(0, 0, 0);
        data.extend_from_slice(&[2, 0, 0, 0x82, 0xA0]);
        let mut label = LabelRecord::decode(RECORD_LABEL, &data, &ctx).expect("decode");
        assert_eq!(label.text(), "あ");
        assert_eq!(label.encode(), data);

        label.set_xf_index(1);
        let mut expected = header(0, 0, 1);
        expected.extend_from_slice(&[1, 0, STR_FLAG_HIGH_BYTE, 0x42, 0x30]);
        assert_eq!(label.encode(), expected);

        let reparsed = LabelRecord::decode(RECORD_LABEL, &label.encode(), &ctx).expect("decode");
        assert_eq!(reparsed.text(), "あ");
        assert_eq!(reparsed.xf_index(), 1);
    }

    #[test]
    fn legacy_multibyte_text_switches_layout_on_mutation() {
        let ctx = CodecContext::with_codepage(932);
        let mut data = header(0, 0, 0);
        data.extend_from_slice(&[2, 0, 0x82, 0xA0]);
        let mut label = LabelRecord::decode(RECORD_LABEL, &data, &ctx).expect("decode");
        assert_eq!(label.layout(), LabelLayout::Legacy);
        assert_eq!(label.text(), "あ");
        assert_eq!(label.encode(), data);

        label.set_xf_index(2);
        let reparsed = LabelRecord::decode(RECORD_LABEL, &label.encode(), &ctx).expect("decode");
        assert_eq!(reparsed.layout(), LabelLayout::Unicode);
        assert_eq!(reparsed.text(), "あ");
    }

    #[test]
    fn set_text_recomputes_wide_flag() {
        let ctx = CodecContext::default();
        let address = CellAddress::new(0, 0).unwrap();
        let mut label = LabelRecord::new(address, 0, "✓", &ctx).expect("new");
        assert!(label.value().is_wide());
        label.set_text("ok").expect("set");
        assert!(!label.value().is_wide());
        assert_eq!(&label.payload()[6..], &[2, 0, 0, b'o', b'k']);
    }

    #[test]
    fn rejects_truncated_strings() {
        let ctx = CodecContext::default();
        let mut data = header(0, 0, 0);
        data.extend_from_slice(&[9, 0, 0]);
        data.extend_from_slice(b"abc");
        let err = LabelRecord::decode(RECORD_LABEL, &data, &ctx).unwrap_err();
        assert!(
            matches!(err, RecordError::MalformedRecord { record_id: RECORD_LABEL, .. }),
            "err={err:?}"
        );
        assert!(matches!(
            LabelRecord::decode(RECORD_LABEL, &data[..7], &ctx),
            Err(RecordError::TruncatedRecord { .. })
        ));
    }
}
