use thiserror::Error;

/// Errors returned while decoding or encoding a single BIFF record.
///
/// These are "fatal to the record": the record could not be decoded (or re-encoded) and no
/// partially-decoded value is returned.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecordError {
    #[error("truncated BIFF record header: need 4 bytes, got {available}")]
    MalformedHeader { available: usize },
    #[error("truncated record 0x{record_id:04X}: need at least {needed} bytes, got {actual}")]
    TruncatedRecord {
        record_id: u16,
        needed: usize,
        actual: usize,
    },
    #[error("malformed record 0x{record_id:04X}: {reason}")]
    MalformedRecord { record_id: u16, reason: String },
    #[error("string too long for BIFF8: {len} UTF-16 code units (max 65535)")]
    StringTooLong { len: usize },
    #[error("cannot split columns {col_first}..={col_last} at column {at}")]
    InvalidSplit { col_first: u16, col_last: u16, at: u16 },
    #[error("cell groups are not adjacent: {reason}")]
    NotAdjacent { reason: String },
    #[error("cell ({row},{col}) is outside the BIFF8 sheet bounds")]
    CellOutOfBounds { row: u32, col: u32 },
    #[error("value {value} cannot be stored exactly as an RK number")]
    NotRkEncodable { value: f64 },
}

impl RecordError {
    pub(crate) fn malformed(record_id: u16, reason: impl Into<String>) -> Self {
        RecordError::MalformedRecord {
            record_id,
            reason: reason.into(),
        }
    }
}

/// Errors returned while walking a record stream.
///
/// Every variant identifies the byte offset of the offending record header; once one of these is
/// returned, the offsets of subsequent records can no longer be trusted.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StreamError {
    #[error("BIFF record offset {offset} out of bounds (len={len})")]
    OffsetOutOfBounds { offset: usize, len: usize },
    #[error("truncated BIFF record header at offset {offset}: {available} of 4 bytes available")]
    MalformedHeader { offset: usize, available: usize },
    #[error(
        "BIFF record 0x{record_id:04X} at offset {offset} extends past end of stream (len={stream_len}, end={end})"
    )]
    PayloadOutOfBounds {
        offset: usize,
        record_id: u16,
        stream_len: usize,
        end: usize,
    },
    #[error(
        "logical BIFF record 0x{record_id:04X} at offset {offset} exceeds max continued size ({cap} bytes)"
    )]
    LogicalRecordTooLarge {
        offset: usize,
        record_id: u16,
        cap: usize,
    },
    #[error(
        "logical BIFF record 0x{record_id:04X} at offset {offset} exceeds max continued fragments ({cap} fragments)"
    )]
    TooManyFragments {
        offset: usize,
        record_id: u16,
        cap: usize,
    },
    #[error("BIFF record 0x{record_id:04X} at offset {offset}: {source}")]
    Record {
        offset: usize,
        record_id: u16,
        #[source]
        source: RecordError,
    },
}

impl StreamError {
    /// Byte offset of the record header the error refers to.
    pub fn offset(&self) -> usize {
        match self {
            StreamError::OffsetOutOfBounds { offset, .. }
            | StreamError::MalformedHeader { offset, .. }
            | StreamError::PayloadOutOfBounds { offset, .. }
            | StreamError::LogicalRecordTooLarge { offset, .. }
            | StreamError::TooManyFragments { offset, .. }
            | StreamError::Record { offset, .. } => *offset,
        }
    }

    /// Record id of the offending record, when the header could be read.
    pub fn record_id(&self) -> Option<u16> {
        match self {
            StreamError::OffsetOutOfBounds { .. } | StreamError::MalformedHeader { .. } => None,
            StreamError::PayloadOutOfBounds { record_id, .. }
            | StreamError::LogicalRecordTooLarge { record_id, .. }
            | StreamError::TooManyFragments { record_id, .. }
            | StreamError::Record { record_id, .. } => Some(*record_id),
        }
    }
}

/// Recoverable problems found inside a record's variable content.
///
/// A record carrying warnings was still decoded; the affected sub-field was skipped or kept as
/// opaque bytes so the record re-encodes byte-identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeWarning {
    /// A cached value carried a type tag this crate does not understand.
    UnknownCachedValueTag { offset: usize, tag: u8 },
    /// A string carried option flags (rich text / extended data) that are not supported in this
    /// position; decoding of the remaining values stopped.
    UnsupportedStringFlags { offset: usize, flags: u8 },
    /// The number of decoded values disagrees with the declared column range.
    ValueCountMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeWarning::UnknownCachedValueTag { offset, tag } => {
                write!(f, "unknown cached value type 0x{tag:02X} at offset {offset}")
            }
            DecodeWarning::UnsupportedStringFlags { offset, flags } => {
                write!(f, "unsupported string flags 0x{flags:02X} at offset {offset}")
            }
            DecodeWarning::ValueCountMismatch { expected, actual } => {
                write!(f, "expected {expected} cached values, found {actual}")
            }
        }
    }
}

/// Errors returned by the compound-file adapter.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing workbook stream (expected `Workbook` or `Book`)")]
    MissingWorkbookStream,
}
