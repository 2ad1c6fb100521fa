use crate::error::{DecodeWarning, RecordError};

use super::strings::DEFAULT_CODEPAGE;

/// Settings shared by every record codec in one workbook stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecContext {
    /// Code page used for compressed (8-bit) strings, from the workbook's CODEPAGE record.
    pub codepage: u16,
}

impl Default for CodecContext {
    fn default() -> Self {
        Self {
            codepage: DEFAULT_CODEPAGE,
        }
    }
}

impl CodecContext {
    pub fn with_codepage(codepage: u16) -> Self {
        Self { codepage }
    }
}

/// The decode/encode contract implemented by every typed record.
///
/// Records own their payload. Decoding keeps the original bytes, so an unmodified record encodes
/// back to exactly what was read; every setter regenerates the payload before returning.
pub trait RecordCodec: Sized {
    /// Decode a logical (CONTINUE-coalesced) payload.
    ///
    /// Fails without producing a partial value when the payload is shorter than the record's
    /// fixed layout or the layout is inconsistent.
    fn decode(record_id: u16, data: &[u8], ctx: &CodecContext) -> Result<Self, RecordError>;

    fn record_id(&self) -> u16;

    /// The current logical payload.
    fn payload(&self) -> &[u8];

    fn encode(&self) -> Vec<u8> {
        self.payload().to_vec()
    }

    /// Recoverable problems found while decoding variable content.
    fn warnings(&self) -> &[DecodeWarning] {
        &[]
    }
}

pub(crate) fn ensure_len(record_id: u16, data: &[u8], needed: usize) -> Result<(), RecordError> {
    if data.len() < needed {
        return Err(RecordError::TruncatedRecord {
            record_id,
            needed,
            actual: data.len(),
        });
    }
    Ok(())
}

pub(crate) fn ensure_record_id(expected: u16, actual: u16) -> Result<(), RecordError> {
    if expected != actual {
        return Err(RecordError::malformed(
            actual,
            format!("expected record id 0x{expected:04X}"),
        ));
    }
    Ok(())
}

/// Little-endian `u16` at `offset`; callers check the length first.
pub(crate) fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

pub(crate) fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

pub(crate) fn read_f64(data: &[u8], offset: usize) -> f64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[offset..offset + 8]);
    f64::from_le_bytes(bytes)
}
