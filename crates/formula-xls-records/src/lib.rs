//! Legacy Excel 97-2003 `.xls` (BIFF8) record stream decoding and encoding.
//!
//! A workbook stream is a sequence of `[record id: u16][length: u16][payload]` records. This crate
//! splits such a stream into typed records, reassembles payloads split across `CONTINUE`
//! records, lets callers mutate decoded records, and writes them back without disturbing anything
//! it did not touch.
//!
//! ```
//! use formula_xls_records::biff::{decode_stream, Record, StreamOptions};
//!
//! // NUMBER record: row 5, column 3, XF 0, value 42.0.
//! let mut stream = vec![0x03, 0x02, 14, 0, 5, 0, 3, 0, 0, 0];
//! stream.extend_from_slice(&42.0f64.to_le_bytes());
//!
//! let mut decoded = decode_stream(&stream[..], &StreamOptions::default()).unwrap();
//! let Record::Number(number) = &mut decoded.records[0].record else { unreachable!() };
//! assert_eq!(number.string_value(), "42");
//!
//! number.set_value(1.5);
//! assert_eq!(&decoded.encode()[10..], &1.5f64.to_le_bytes());
//! ```
//!
//! Records this crate does not interpret pass through as [`biff::OpaqueRecord`]s, so a stream
//! that is decoded and re-encoded without mutation is reproduced byte for byte.

pub mod biff;
pub mod container;
pub mod error;
pub mod source;

pub use biff::{CodecContext, Record, RecordCodec};
pub use container::{open_xls_workbook_stream, read_workbook_stream, read_workbook_stream_from_xls};
pub use error::{ContainerError, DecodeWarning, RecordError, StreamError};
pub use source::{BlockSource, ByteSource};
