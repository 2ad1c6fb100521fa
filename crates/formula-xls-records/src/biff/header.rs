use crate::error::RecordError;

/// Size of the `(record id, length)` header that frames every BIFF record.
pub const RECORD_HEADER_LEN: usize = 4;

/// The 4-byte header in front of every physical BIFF record.
///
/// Both fields are stored little-endian. The record id space is open: unknown ids are legal and
/// are passed through untouched by the rest of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordHeader {
    pub record_id: u16,
    pub len: u16,
}

impl RecordHeader {
    pub const fn new(record_id: u16, len: u16) -> Self {
        Self { record_id, len }
    }

    /// Decode a header from the first four bytes of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self, RecordError> {
        let Some(header) = bytes.get(..RECORD_HEADER_LEN) else {
            return Err(RecordError::MalformedHeader {
                available: bytes.len(),
            });
        };
        Ok(Self {
            record_id: u16::from_le_bytes([header[0], header[1]]),
            len: u16::from_le_bytes([header[2], header[3]]),
        })
    }

    pub fn encode(&self) -> [u8; RECORD_HEADER_LEN] {
        let id = self.record_id.to_le_bytes();
        let len = self.len.to_le_bytes();
        [id[0], id[1], len[0], len[1]]
    }
}
