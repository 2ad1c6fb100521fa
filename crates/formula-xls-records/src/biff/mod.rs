//! BIFF8 record framing, codecs and dispatch.
//!
//! The layering, bottom up:
//!
//! - [`header`] and [`records`]: 4-byte record headers, physical/logical record iteration over a
//!   [`ByteSource`](crate::source::ByteSource), and `CONTINUE` assembly/disassembly.
//! - [`strings`] and [`rk`]: value encodings shared by many records.
//! - [`codec`] and the per-record modules: the [`RecordCodec`] contract and its implementations.
//! - [`registry`]: opcode → codec dispatch and the [`Record`] sum type.
//! - [`stream`]: decoding/encoding of whole record streams.

pub mod boolerr;
pub mod cell;
pub mod codec;
pub mod crn;
pub mod header;
pub mod label;
pub mod mulcell;
pub mod number;
pub mod opaque;
pub mod protection;
pub mod records;
pub mod registry;
pub mod rk;
pub mod stream;
pub mod strings;

pub use boolerr::{error_code, error_label, BoolErrRecord, BoolErrValue};
pub use cell::{BlankRecord, CellAddress, CellRecord, MAX_COLS, MAX_ROWS};
pub use codec::{CodecContext, RecordCodec};
pub use crn::{CachedValue, CrnRecord};
pub use header::RecordHeader;
pub use label::{LabelLayout, LabelRecord};
pub use mulcell::{
    CellView, MulBlankRecord, MulCellEntry, MulCellRecord, MulRkRecord, RkEntry, XfEntry,
};
pub use number::{NumberRecord, NumericDisplay, RkRecord};
pub use opaque::OpaqueRecord;
pub use protection::{
    hash_password, verify_password, PasswordRecord, ProtectKind, ProtectRecord,
};
pub use records::{
    assemble, disassemble, disassemble_with_sizes, BiffRecord, BiffRecordIter, Fragments,
    LogicalBiffRecord, LogicalBiffRecordIter, MAX_RECORD_DATA_LEN, RECORD_CONTINUE,
};
pub use registry::{lookup, Record, RecordKind};
pub use stream::{
    decode_stream, encode_record, DecodePolicy, DecodedRecord, DecodedStream, RecordWriter,
    StreamOptions,
};
pub use strings::{decode_unicode_string, encode_unicode_string, UnicodeString};
