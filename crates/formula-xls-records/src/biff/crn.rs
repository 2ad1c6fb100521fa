//! CRN: cached cell values of one row of an external (SUPBOOK) sheet.
//!
//! Layout ([MS-XLS] 2.4.65): `[colLast: u8][colFirst: u8][row: u16]` followed by one `SerAr` value
//! per column. Each value starts with a type tag; all non-string values occupy 8 bytes after it.

use crate::error::{DecodeWarning, RecordError};

use super::codec::{ensure_len, ensure_record_id, read_f64, read_u16, CodecContext, RecordCodec};
use super::strings::{decode_ansi, UnicodeString, STR_FLAG_HIGH_BYTE};

pub const RECORD_CRN: u16 = 0x005A;

const CRN_HEADER_LEN: usize = 4;
const SERAR_VALUE_LEN: usize = 8;

const SERAR_NIL: u8 = 0x00;
const SERAR_NUM: u8 = 0x01;
const SERAR_STR: u8 = 0x02;
const SERAR_BOOL: u8 = 0x04;
const SERAR_ERR: u8 = 0x10;

/// Cap on recorded warnings so a record full of garbage can't grow the list without bound.
const MAX_CRN_WARNINGS: usize = 64;

/// One cached value of an external cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Empty,
    Number(f64),
    String(UnicodeString),
    Bool(bool),
    Error(u8),
    /// A value with an unrecognized type tag, kept verbatim.
    Opaque { tag: u8, bytes: Vec<u8> },
}

impl CachedValue {
    pub fn string(text: &str, ctx: &CodecContext) -> Result<Self, RecordError> {
        Ok(CachedValue::String(UnicodeString::new(text, ctx.codepage)?))
    }

    fn write_to(&self, codepage: u16, out: &mut Vec<u8>) {
        let fixed = |out: &mut Vec<u8>, tag: u8, first: u8| {
            out.push(tag);
            out.push(first);
            out.extend_from_slice(&[0u8; SERAR_VALUE_LEN - 1]);
        };
        match self {
            CachedValue::Empty => {
                out.push(SERAR_NIL);
                out.extend_from_slice(&[0u8; SERAR_VALUE_LEN]);
            }
            CachedValue::Number(value) => {
                out.push(SERAR_NUM);
                out.extend_from_slice(&value.to_le_bytes());
            }
            CachedValue::String(value) => {
                out.push(SERAR_STR);
                value.write_to(codepage, out);
            }
            CachedValue::Bool(value) => fixed(out, SERAR_BOOL, u8::from(*value)),
            CachedValue::Error(code) => fixed(out, SERAR_ERR, *code),
            CachedValue::Opaque { tag, bytes } => {
                out.push(*tag);
                out.extend_from_slice(bytes);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrnRecord {
    row: u16,
    col_first: u8,
    col_last: u8,
    values: Vec<CachedValue>,
    /// Undecodable bytes following the last decoded value.
    trailer: Vec<u8>,
    warnings: Vec<DecodeWarning>,
    codepage: u16,
    data: Vec<u8>,
}

impl CrnRecord {
    pub fn new(
        row: u16,
        col_first: u8,
        values: Vec<CachedValue>,
        ctx: &CodecContext,
    ) -> Result<Self, RecordError> {
        let mut record = Self {
            row,
            col_first,
            col_last: col_first,
            values: Vec::new(),
            trailer: Vec::new(),
            warnings: Vec::new(),
            codepage: ctx.codepage,
            data: Vec::new(),
        };
        record.set_values(values)?;
        Ok(record)
    }

    pub fn row(&self) -> u16 {
        self.row
    }

    pub fn col_first(&self) -> u8 {
        self.col_first
    }

    pub fn col_last(&self) -> u8 {
        self.col_last
    }

    pub fn values(&self) -> &[CachedValue] {
        &self.values
    }

    pub fn trailer(&self) -> &[u8] {
        &self.trailer
    }

    pub fn set_value(&mut self, index: usize, value: CachedValue) -> Result<(), RecordError> {
        let col = u32::from(self.col_first) + index as u32;
        let slot = self
            .values
            .get_mut(index)
            .ok_or(RecordError::CellOutOfBounds {
                row: u32::from(self.row),
                col,
            })?;
        *slot = value;
        self.rebuild();
        Ok(())
    }

    /// Replace every value; the column range becomes `col_first..col_first + values.len()`.
    ///
    /// Any undecodable trailer and decode warnings are discarded.
    pub fn set_values(&mut self, values: Vec<CachedValue>) -> Result<(), RecordError> {
        if values.is_empty() {
            return Err(RecordError::malformed(
                RECORD_CRN,
                "a CRN record needs at least one value",
            ));
        }
        let col_last = usize::from(self.col_first) + values.len() - 1;
        let col_last = u8::try_from(col_last).map_err(|_| RecordError::CellOutOfBounds {
            row: u32::from(self.row),
            col: col_last as u32,
        })?;
        self.col_last = col_last;
        self.values = values;
        self.trailer.clear();
        self.warnings.clear();
        self.rebuild();
        Ok(())
    }

    fn rebuild(&mut self) {
        self.data.clear();
        self.data.push(self.col_last);
        self.data.push(self.col_first);
        self.data.extend_from_slice(&self.row.to_le_bytes());
        for value in &self.values {
            value.write_to(self.codepage, &mut self.data);
        }
        self.data.extend_from_slice(&self.trailer);
    }
}

fn push_warning(warnings: &mut Vec<DecodeWarning>, warning: DecodeWarning) {
    log::warn!("CRN record: {warning}");
    if warnings.len() < MAX_CRN_WARNINGS {
        warnings.push(warning);
    }
}

impl RecordCodec for CrnRecord {
    fn decode(record_id: u16, data: &[u8], ctx: &CodecContext) -> Result<Self, RecordError> {
        ensure_record_id(RECORD_CRN, record_id)?;
        ensure_len(record_id, data, CRN_HEADER_LEN)?;

        let col_last = data[0];
        let col_first = data[1];
        let row = read_u16(data, 2);
        if col_last < col_first {
            return Err(RecordError::malformed(
                record_id,
                format!("colLast {col_last} precedes colFirst {col_first}"),
            ));
        }

        let mut values = Vec::new();
        let mut warnings = Vec::new();
        let mut trailer = Vec::new();
        let mut pos = CRN_HEADER_LEN;
        while pos < data.len() {
            let tag = data[pos];
            match tag {
                SERAR_NIL | SERAR_NUM | SERAR_BOOL | SERAR_ERR => {
                    ensure_len(record_id, data, pos + 1 + SERAR_VALUE_LEN)?;
                    let value = match tag {
                        SERAR_NIL => CachedValue::Empty,
                        SERAR_NUM => CachedValue::Number(read_f64(data, pos + 1)),
                        SERAR_BOOL => CachedValue::Bool(data[pos + 1] != 0),
                        _ => CachedValue::Error(data[pos + 1]),
                    };
                    values.push(value);
                    pos += 1 + SERAR_VALUE_LEN;
                }
                SERAR_STR => {
                    ensure_len(record_id, data, pos + 4)?;
                    let cch = usize::from(read_u16(data, pos + 1));
                    let flags = data[pos + 3];
                    if flags & !STR_FLAG_HIGH_BYTE != 0 {
                        push_warning(
                            &mut warnings,
                            DecodeWarning::UnsupportedStringFlags { offset: pos, flags },
                        );
                        trailer = data[pos..].to_vec();
                        break;
                    }
                    let wide = flags & STR_FLAG_HIGH_BYTE != 0;
                    let start = pos + 4;
                    let len = if wide { cch * 2 } else { cch };
                    ensure_len(record_id, data, start + len)?;
                    let chars = &data[start..start + len];
                    let text = if wide {
                        let units: Vec<u16> = chars
                            .chunks_exact(2)
                            .map(|c| u16::from_le_bytes([c[0], c[1]]))
                            .collect();
                        String::from_utf16_lossy(&units)
                    } else {
                        decode_ansi(ctx.codepage, chars)
                    };
                    values.push(CachedValue::String(UnicodeString::from_decoded(
                        text,
                        wide,
                        ctx.codepage,
                    )));
                    pos = start + len;
                }
                _ => {
                    push_warning(
                        &mut warnings,
                        DecodeWarning::UnknownCachedValueTag { offset: pos, tag },
                    );
                    let end = (pos + 1 + SERAR_VALUE_LEN).min(data.len());
                    values.push(CachedValue::Opaque {
                        tag,
                        bytes: data[pos + 1..end].to_vec(),
                    });
                    pos = end;
                }
            }
        }

        let expected = usize::from(col_last - col_first) + 1;
        if trailer.is_empty() && values.len() != expected {
            push_warning(
                &mut warnings,
                DecodeWarning::ValueCountMismatch {
                    expected,
                    actual: values.len(),
                },
            );
        }

        Ok(Self {
            row,
            col_first,
            col_last,
            values,
            trailer,
            warnings,
            codepage: ctx.codepage,
            data: data.to_vec(),
        })
    }

    fn record_id(&self) -> u16 {
        RECORD_CRN
    }

    fn payload(&self) -> &[u8] {
        &self.data
    }

    fn warnings(&self) -> &[DecodeWarning] {
        &self.warnings
    }
}
