//! Whole-stream decoding and encoding.

use crate::error::StreamError;
use crate::source::ByteSource;

use super::codec::CodecContext;
use super::records::{continues_any_record, disassemble_with_sizes, LogicalBiffRecordIter};
use super::registry::Record;

/// BIFF `CODEPAGE` record id; updates the code page used for subsequent records.
pub const RECORD_CODEPAGE: u16 = 0x0042;

/// What to do when a single record fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Stop and return the error.
    #[default]
    Abort,
    /// Keep the record as opaque bytes, report the error and carry on.
    SkipAndReport,
}

#[derive(Debug, Clone, Copy)]
pub struct StreamOptions {
    pub policy: DecodePolicy,
    /// Record ids whose trailing `CONTINUE` records are coalesced into the logical payload.
    pub allows_continuation: fn(u16) -> bool,
    /// Initial codec settings; a `CODEPAGE` record in the stream overrides the code page.
    pub codec: CodecContext,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            policy: DecodePolicy::default(),
            allows_continuation: continues_any_record,
            codec: CodecContext::default(),
        }
    }
}

/// A decoded record together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    /// Offset of the first physical record header.
    pub offset: usize,
    pub record: Record,
    /// Payload size of every physical fragment (primary first).
    pub fragment_sizes: Vec<usize>,
}

impl DecodedRecord {
    /// A record built in memory, to be written with default fragmentation.
    pub fn new(record: Record) -> Self {
        Self {
            offset: 0,
            record,
            fragment_sizes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedStream {
    pub records: Vec<DecodedRecord>,
    /// Record-level errors tolerated under [`DecodePolicy::SkipAndReport`].
    pub skipped: Vec<StreamError>,
}

impl DecodedStream {
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = RecordWriter::new();
        for record in &self.records {
            writer.write_decoded(record);
        }
        writer.finish()
    }
}

/// Decode every record of a stream, in stream order.
///
/// Framing errors always abort: once a header or payload is out of bounds, nothing after it can
/// be trusted. Record-level errors follow `options.policy`.
pub fn decode_stream<S: ByteSource + ?Sized>(
    source: &S,
    options: &StreamOptions,
) -> Result<DecodedStream, StreamError> {
    let mut ctx = options.codec;
    let mut out = DecodedStream::default();

    for logical in LogicalBiffRecordIter::new(source, options.allows_continuation) {
        let logical = logical?;
        let record_id = logical.record_id;

        if record_id == RECORD_CODEPAGE {
            if let Some(bytes) = logical.data.get(..2) {
                ctx.codepage = u16::from_le_bytes([bytes[0], bytes[1]]);
            }
        }

        let record = match Record::decode(record_id, &logical.data, &ctx) {
            Ok(record) => record,
            Err(source) => {
                let err = StreamError::Record {
                    offset: logical.offset,
                    record_id,
                    source,
                };
                match options.policy {
                    DecodePolicy::Abort => return Err(err),
                    DecodePolicy::SkipAndReport => {
                        log::debug!("keeping undecodable record as opaque: {err}");
                        out.skipped.push(err);
                        Record::opaque(record_id, &logical.data)
                    }
                }
            }
        };

        for warning in record.warnings() {
            log::debug!(
                "record 0x{record_id:04X} at offset {}: {warning}",
                logical.offset
            );
        }

        out.records.push(DecodedRecord {
            offset: logical.offset,
            record,
            fragment_sizes: logical.fragment_sizes,
        });
    }

    Ok(out)
}

/// Header plus payload of one record, split into `CONTINUE` fragments when needed.
pub fn encode_record(record: &Record) -> Vec<u8> {
    let mut writer = RecordWriter::new();
    writer.write(record);
    writer.finish()
}

/// Serializes records back into a BIFF record stream.
#[derive(Debug, Default)]
pub struct RecordWriter {
    out: Vec<u8>,
}

impl RecordWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `record`, splitting payloads larger than one physical record.
    pub fn write(&mut self, record: &Record) {
        self.write_with_sizes(record, &[]);
    }

    /// Append a decoded record, reusing its original fragment boundaries when they still fit.
    pub fn write_decoded(&mut self, decoded: &DecodedRecord) {
        self.write_with_sizes(&decoded.record, &decoded.fragment_sizes);
    }

    fn write_with_sizes(&mut self, record: &Record, sizes: &[usize]) {
        let record_id = record.record_id();
        let payload = record.payload();
        disassemble_with_sizes(payload, sizes).write_to(record_id, &mut self.out);
    }

    /// Append raw, already-framed bytes.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn finish(self) -> Vec<u8> {
        self.out
    }
}
