//! Physical and logical BIFF record framing.
//!
//! A *physical* record is a 4-byte header plus at most [`MAX_RECORD_DATA_LEN`] payload bytes. A
//! *logical* record is a physical record followed by zero or more `CONTINUE` records whose
//! payloads extend it. Reading coalesces fragments into one buffer; writing splits a logical
//! payload back into physical fragments.

use std::borrow::Cow;

use crate::error::StreamError;
use crate::source::ByteSource;

use super::header::{RecordHeader, RECORD_HEADER_LEN};

/// BIFF `CONTINUE` record id.
pub const RECORD_CONTINUE: u16 = 0x003C;

/// Largest payload a single physical BIFF8 record may carry.
pub const MAX_RECORD_DATA_LEN: usize = 8224;

// Hard caps for coalescing `CONTINUE` records into a single logical record.
//
// A malformed stream can contain extremely long runs of `CONTINUE` records, which would otherwise
// result in unbounded allocations when fragments are concatenated. The caps only apply when
// coalescing actually happens.
#[cfg(not(test))]
pub const MAX_LOGICAL_RECORD_BYTES: usize = 16 * 1024 * 1024;
#[cfg(test)]
pub const MAX_LOGICAL_RECORD_BYTES: usize = 32 * 1024;

// Includes the initial fragment and every `CONTINUE` fragment.
#[cfg(not(test))]
pub const MAX_LOGICAL_RECORD_FRAGMENTS: usize = 4096;
#[cfg(test)]
pub const MAX_LOGICAL_RECORD_FRAGMENTS: usize = 16;

/// Default continuation predicate: every record may be continued except `CONTINUE` itself.
pub fn continues_any_record(record_id: u16) -> bool {
    record_id != RECORD_CONTINUE
}

/// Read a single physical BIFF record at `offset`.
pub fn read_biff_record<S: ByteSource + ?Sized>(
    source: &S,
    offset: usize,
) -> Option<(u16, Cow<'_, [u8]>)> {
    let mut iter = BiffRecordIter::from_offset(source, offset).ok()?;
    match iter.next()? {
        Ok(record) => Some((record.record_id, record.data)),
        Err(_) => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiffRecord<'a> {
    /// Offset of the record header in the parent stream.
    pub offset: usize,
    pub record_id: u16,
    pub data: Cow<'a, [u8]>,
}

/// Iterator over physical BIFF records.
///
/// This performs bounds checking on the record header and length. A truncated header or payload
/// yields an `Err` and terminates iteration.
pub struct BiffRecordIter<'a, S: ByteSource + ?Sized> {
    source: &'a S,
    offset: usize,
}

impl<'a, S: ByteSource + ?Sized> BiffRecordIter<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source, offset: 0 }
    }

    pub fn from_offset(source: &'a S, offset: usize) -> Result<Self, StreamError> {
        if offset > source.len() {
            return Err(StreamError::OffsetOutOfBounds {
                offset,
                len: source.len(),
            });
        }
        Ok(Self { source, offset })
    }

    /// Offset of the next record header.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn fail(&mut self, err: StreamError) -> Option<Result<BiffRecord<'a>, StreamError>> {
        self.offset = self.source.len();
        Some(Err(err))
    }
}

impl<'a, S: ByteSource + ?Sized> Iterator for BiffRecordIter<'a, S> {
    type Item = Result<BiffRecord<'a>, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        let source = self.source;
        let stream_len = source.len();
        if self.offset >= stream_len {
            return None;
        }

        let offset = self.offset;
        let remaining = stream_len - offset;
        let header = match source
            .read_bytes(offset, RECORD_HEADER_LEN)
            .map(|bytes| RecordHeader::decode(&bytes))
        {
            Some(Ok(header)) => header,
            _ => {
                return self.fail(StreamError::MalformedHeader {
                    offset,
                    available: remaining.min(RECORD_HEADER_LEN),
                })
            }
        };

        let data_start = offset + RECORD_HEADER_LEN;
        let len = header.len as usize;
        let data_end = match data_start.checked_add(len) {
            Some(end) => end,
            None => {
                return self.fail(StreamError::PayloadOutOfBounds {
                    offset,
                    record_id: header.record_id,
                    stream_len,
                    end: usize::MAX,
                })
            }
        };

        let Some(data) = source.read_bytes(data_start, len) else {
            return self.fail(StreamError::PayloadOutOfBounds {
                offset,
                record_id: header.record_id,
                stream_len,
                end: data_end,
            });
        };

        self.offset = data_end;
        Some(Ok(BiffRecord {
            offset,
            record_id: header.record_id,
            data,
        }))
    }
}

/// A logical BIFF record. Records split across one or more physical `CONTINUE` records have
/// their fragments concatenated into `data`.
///
/// `fragment_sizes` stores the size of each physical fragment in `data` order, so writers can
/// reproduce the original framing and parsers can reason about `CONTINUE` boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalBiffRecord<'a> {
    /// Byte offset of the first physical record header in the parent stream.
    pub offset: usize,
    pub record_id: u16,
    pub data: Cow<'a, [u8]>,
    pub fragment_sizes: Vec<usize>,
}

impl<'a> LogicalBiffRecord<'a> {
    pub fn is_continued(&self) -> bool {
        self.fragment_sizes.len() > 1
    }

    pub fn first_fragment(&self) -> &[u8] {
        let first_len = self.fragment_sizes.first().copied().unwrap_or(0);
        self.data.get(0..first_len).unwrap_or_default()
    }

    pub fn fragments(&self) -> FragmentIter<'_> {
        FragmentIter {
            data: self.data.as_ref(),
            sizes: &self.fragment_sizes,
            idx: 0,
            offset: 0,
        }
    }

    pub fn into_owned(self) -> LogicalBiffRecord<'static> {
        LogicalBiffRecord {
            offset: self.offset,
            record_id: self.record_id,
            data: Cow::Owned(self.data.into_owned()),
            fragment_sizes: self.fragment_sizes,
        }
    }
}

pub struct FragmentIter<'a> {
    data: &'a [u8],
    sizes: &'a [usize],
    idx: usize,
    offset: usize,
}

impl<'a> Iterator for FragmentIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let size = *self.sizes.get(self.idx)?;
        let start = self.offset;
        let end = start.checked_add(size)?;
        let out = self.data.get(start..end)?;
        self.idx = self.idx.checked_add(1)?;
        self.offset = end;
        Some(out)
    }
}

/// Iterates over BIFF records, combining `CONTINUE` fragments for record ids for which
/// `allows_continuation(record_id) == true`.
pub struct LogicalBiffRecordIter<'a, S: ByteSource + ?Sized> {
    iter: std::iter::Peekable<BiffRecordIter<'a, S>>,
    allows_continuation: fn(u16) -> bool,
    finished: bool,
}

impl<'a, S: ByteSource + ?Sized> LogicalBiffRecordIter<'a, S> {
    pub fn new(source: &'a S, allows_continuation: fn(u16) -> bool) -> Self {
        Self {
            iter: BiffRecordIter::new(source).peekable(),
            allows_continuation,
            finished: false,
        }
    }

    pub fn from_offset(
        source: &'a S,
        offset: usize,
        allows_continuation: fn(u16) -> bool,
    ) -> Result<Self, StreamError> {
        Ok(Self {
            iter: BiffRecordIter::from_offset(source, offset)?.peekable(),
            allows_continuation,
            finished: false,
        })
    }
}

impl<'a, S: ByteSource + ?Sized> Iterator for LogicalBiffRecordIter<'a, S> {
    type Item = Result<LogicalBiffRecord<'a>, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let first = match self.iter.next()? {
            Ok(record) => record,
            Err(err) => {
                self.finished = true;
                return Some(Err(err));
            }
        };

        let start_offset = first.offset;
        let record_id = first.record_id;
        let data = first.data;

        let continued = (self.allows_continuation)(record_id)
            && matches!(self.iter.peek(), Some(Ok(next)) if next.record_id == RECORD_CONTINUE);
        if !continued {
            let len = data.len();
            return Some(Ok(LogicalBiffRecord {
                offset: start_offset,
                record_id,
                data,
                fragment_sizes: vec![len],
            }));
        }

        // Only allocate/copy when we actually see a CONTINUE record.
        let mut fragment_sizes = vec![data.len()];
        let mut combined: Vec<u8> = data.into_owned();

        while let Some(peek) = self.iter.peek() {
            let next = match peek {
                Ok(next) => next,
                // Leave the malformed record to be surfaced on the next iteration.
                Err(_) => break,
            };
            if next.record_id != RECORD_CONTINUE {
                break;
            }

            let next = match self.iter.next() {
                Some(Ok(record)) => record,
                Some(Err(err)) => {
                    self.finished = true;
                    return Some(Err(err));
                }
                None => break,
            };

            let new_len = combined
                .len()
                .checked_add(next.data.len())
                .unwrap_or(usize::MAX);
            if new_len > MAX_LOGICAL_RECORD_BYTES {
                self.finished = true;
                return Some(Err(StreamError::LogicalRecordTooLarge {
                    offset: start_offset,
                    record_id,
                    cap: MAX_LOGICAL_RECORD_BYTES,
                }));
            }

            if fragment_sizes.len() >= MAX_LOGICAL_RECORD_FRAGMENTS {
                self.finished = true;
                return Some(Err(StreamError::TooManyFragments {
                    offset: start_offset,
                    record_id,
                    cap: MAX_LOGICAL_RECORD_FRAGMENTS,
                }));
            }

            fragment_sizes.push(next.data.len());
            combined.extend_from_slice(&next.data);
        }

        Some(Ok(LogicalBiffRecord {
            offset: start_offset,
            record_id,
            data: Cow::Owned(combined),
            fragment_sizes,
        }))
    }
}

/// Concatenate a primary payload and its continuation payloads, in order.
pub fn assemble(primary: &[u8], continuations: &[&[u8]]) -> Vec<u8> {
    let total = continuations
        .iter()
        .fold(primary.len(), |acc, frag| acc + frag.len());
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(primary);
    for fragment in continuations {
        out.extend_from_slice(fragment);
    }
    out
}

/// A logical payload split into physical fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragments<'a> {
    pub primary: &'a [u8],
    pub continuations: Vec<&'a [u8]>,
}

impl<'a> Fragments<'a> {
    /// Number of physical records, including the primary one.
    pub fn fragment_count(&self) -> usize {
        1 + self.continuations.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        std::iter::once(self.primary).chain(self.continuations.iter().copied())
    }

    /// Size in bytes of the physical encoding (headers included).
    pub fn encoded_len(&self) -> usize {
        self.iter()
            .map(|fragment| RECORD_HEADER_LEN + fragment.len())
            .sum()
    }

    /// Append the physical records (primary record id first, then `CONTINUE`s) to `out`.
    pub fn write_to(&self, record_id: u16, out: &mut Vec<u8>) {
        out.reserve(self.encoded_len());
        for (idx, fragment) in self.iter().enumerate() {
            let id = if idx == 0 { record_id } else { RECORD_CONTINUE };
            // Fragments never exceed the 16-bit header limit.
            let header = RecordHeader::new(id, fragment.len() as u16);
            out.extend_from_slice(&header.encode());
            out.extend_from_slice(fragment);
        }
    }
}

/// Split `logical` into chunks of at most `max_fragment_len` bytes.
///
/// The first chunk is the primary payload; every further chunk becomes a pure `CONTINUE` payload
/// with nothing inserted between fragments. An empty payload yields only an empty primary.
///
/// # Panics
///
/// Panics when `max_fragment_len` is zero or larger than [`MAX_RECORD_DATA_LEN`].
pub fn disassemble(logical: &[u8], max_fragment_len: usize) -> Fragments<'_> {
    assert!(
        max_fragment_len > 0 && max_fragment_len <= MAX_RECORD_DATA_LEN,
        "max_fragment_len must be in 1..={MAX_RECORD_DATA_LEN}, got {max_fragment_len}"
    );

    let mut chunks = logical.chunks(max_fragment_len);
    let primary = chunks.next().unwrap_or_default();
    Fragments {
        primary,
        continuations: chunks.collect(),
    }
}

/// Split `logical` along previously recorded fragment boundaries.
///
/// Recorded sizes are trusted up to the 16-bit header limit so that a stream written by another
/// producer (some emit physical records larger than [`MAX_RECORD_DATA_LEN`]) is reproduced
/// exactly. Falls back to [`disassemble`] with [`MAX_RECORD_DATA_LEN`] when `sizes` no longer
/// describes `logical` (the payload changed length).
pub fn disassemble_with_sizes<'a>(logical: &'a [u8], sizes: &[usize]) -> Fragments<'a> {
    let matches = !sizes.is_empty()
        && sizes.iter().sum::<usize>() == logical.len()
        && sizes.iter().all(|&size| size <= usize::from(u16::MAX));
    if !matches {
        return disassemble(logical, MAX_RECORD_DATA_LEN);
    }

    let mut offset = 0usize;
    let mut pieces = sizes.iter().map(move |&size| {
        let piece = &logical[offset..offset + size];
        offset += size;
        piece
    });
    let primary = pieces.next().unwrap_or_default();
    Fragments {
        primary,
        continuations: pieces.collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::BlockSource;

    fn record(id: u16, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&id.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn iterates_physical_records_with_bounds_checks() {
        let stream = [record(0x0001, &[1, 2, 3]), record(0x0002, &[4])].concat();
        let mut iter = BiffRecordIter::from_offset(stream.as_slice(), 0).unwrap();

        let r1 = iter.next().unwrap().unwrap();
        assert_eq!(r1.offset, 0);
        assert_eq!(r1.record_id, 0x0001);
        assert_eq!(r1.data.as_ref(), &[1, 2, 3]);

        let r2 = iter.next().unwrap().unwrap();
        assert_eq!(r2.offset, 7);
        assert_eq!(r2.record_id, 0x0002);
        assert_eq!(r2.data.as_ref(), &[4]);

        assert!(iter.next().is_none());
    }

    #[test]
    fn physical_iter_errors_on_truncated_header() {
        let stream = vec![0x01, 0x02, 0x03];
        let mut iter = BiffRecordIter::new(&stream);
        let err = iter.next().unwrap().unwrap_err();
        assert_eq!(
            err,
            StreamError::MalformedHeader {
                offset: 0,
                available: 3
            }
        );
        assert!(iter.next().is_none());
    }

    #[test]
    fn physical_iter_errors_on_truncated_payload() {
        let mut stream = Vec::new();
        stream.extend_from_slice(&0x0001u16.to_le_bytes());
        stream.extend_from_slice(&4u16.to_le_bytes());
        stream.extend_from_slice(&[1, 2]);

        let mut iter = BiffRecordIter::new(&stream);
        let err = iter.next().unwrap().unwrap_err();
        assert!(
            err.to_string().contains("extends past end of stream"),
            "err={err}"
        );
        assert_eq!(err.offset(), 0);
        assert_eq!(err.record_id(), Some(0x0001));
        assert!(iter.next().is_none());
    }

    #[test]
    fn from_offset_rejects_out_of_bounds_offsets() {
        let stream = record(0x0001, &[1]);
        assert!(BiffRecordIter::from_offset(stream.as_slice(), stream.len()).is_ok());
        assert!(matches!(
            BiffRecordIter::from_offset(stream.as_slice(), stream.len() + 1),
            Err(StreamError::OffsetOutOfBounds { .. })
        ));
    }

    #[test]
    fn physical_iter_reads_headers_split_across_blocks() {
        let stream = [record(0x0001, &[1, 2, 3]), record(0x0002, &[4, 5])].concat();
        // Block length 5 puts the second header across a block boundary.
        let source = BlockSource::from_contiguous(&stream, 5);
        let ids: Vec<(u16, Vec<u8>)> = BiffRecordIter::new(&source)
            .map(|r| {
                let r = r.unwrap();
                (r.record_id, r.data.into_owned())
            })
            .collect();
        assert_eq!(ids, vec![(0x0001, vec![1, 2, 3]), (0x0002, vec![4, 5])]);
    }

    #[test]
    fn read_biff_record_returns_first_record_at_offset() {
        let stream = [record(0x0001, &[1]), record(0x0002, &[2, 3])].concat();
        let (id, data) = read_biff_record(stream.as_slice(), 5).expect("record");
        assert_eq!(id, 0x0002);
        assert_eq!(data.as_ref(), &[2, 3]);
        assert!(read_biff_record(stream.as_slice(), 99).is_none());
    }

    #[test]
    fn coalesces_continues_for_allowed_record_ids() {
        let stream = [
            record(0x00AA, &[1, 2]),
            record(RECORD_CONTINUE, &[3]),
            record(RECORD_CONTINUE, &[4, 5]),
            record(0x00BB, &[9]),
        ]
        .concat();

        let mut iter = LogicalBiffRecordIter::new(stream.as_slice(), |id| id == 0x00AA);

        let first = iter.next().unwrap().unwrap();
        assert_eq!(first.record_id, 0x00AA);
        assert_eq!(first.data.as_ref(), &[1, 2, 3, 4, 5]);
        assert_eq!(first.fragment_sizes, vec![2, 1, 2]);
        assert!(first.is_continued());
        assert_eq!(first.first_fragment(), &[1, 2]);
        let frags: Vec<&[u8]> = first.fragments().collect();
        assert_eq!(frags, vec![&[1u8, 2][..], &[3][..], &[4, 5][..]]);

        let second = iter.next().unwrap().unwrap();
        assert_eq!(second.record_id, 0x00BB);
        assert_eq!(second.data.as_ref(), &[9]);
        assert_eq!(second.fragment_sizes, vec![1]);
        assert!(!second.is_continued());

        assert!(iter.next().is_none());
    }

    #[test]
    fn does_not_coalesce_when_continuation_is_disallowed() {
        let stream = [record(0x00AA, &[1, 2]), record(RECORD_CONTINUE, &[3])].concat();
        let mut iter = LogicalBiffRecordIter::new(stream.as_slice(), |_| false);

        let first = iter.next().unwrap().unwrap();
        assert_eq!(first.data.as_ref(), &[1, 2]);

        // CONTINUE becomes its own logical record when the parent doesn't allow continuation.
        let second = iter.next().unwrap().unwrap();
        assert_eq!(second.record_id, RECORD_CONTINUE);
        assert_eq!(second.data.as_ref(), &[3]);
    }

    #[test]
    fn orphan_continue_is_yielded_on_its_own() {
        let stream = [record(RECORD_CONTINUE, &[7]), record(0x00AA, &[1])].concat();
        let mut iter = LogicalBiffRecordIter::new(stream.as_slice(), continues_any_record);

        let orphan = iter.next().unwrap().unwrap();
        assert_eq!(orphan.record_id, RECORD_CONTINUE);
        assert_eq!(orphan.data.as_ref(), &[7]);
        assert_eq!(iter.next().unwrap().unwrap().record_id, 0x00AA);
    }

    #[test]
    fn logical_iter_surfaces_malformed_record_after_coalescing() {
        let mut stream = [record(0x00AA, &[1]), record(RECORD_CONTINUE, &[2])].concat();
        stream.extend_from_slice(&[0x3C, 0x00]); // truncated header

        let mut iter = LogicalBiffRecordIter::new(stream.as_slice(), continues_any_record);
        let first = iter.next().unwrap().unwrap();
        assert_eq!(first.data.as_ref(), &[1, 2]);
        assert!(matches!(
            iter.next(),
            Some(Err(StreamError::MalformedHeader { offset: 10, .. }))
        ));
        assert!(iter.next().is_none());
    }

    #[test]
    fn logical_iter_errors_on_oversized_continued_record() {
        let cont_payload = vec![0u8; MAX_RECORD_DATA_LEN];
        let mut parts = vec![record(0x00AA, &[0u8; 1])];
        let mut total = 1usize;
        while total <= MAX_LOGICAL_RECORD_BYTES {
            parts.push(record(RECORD_CONTINUE, &cont_payload));
            total += cont_payload.len();
        }
        let stream = parts.concat();

        let mut iter = LogicalBiffRecordIter::new(stream.as_slice(), |id| id == 0x00AA);
        let err = iter.next().unwrap().unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "logical BIFF record 0x00AA at offset 0 exceeds max continued size ({} bytes)",
                MAX_LOGICAL_RECORD_BYTES
            )
        );
        assert!(iter.next().is_none());
    }

    #[test]
    fn logical_iter_errors_on_excessive_continue_fragments() {
        let mut parts = vec![record(0x00AA, &[])];
        for _ in 0..=MAX_LOGICAL_RECORD_FRAGMENTS {
            parts.push(record(RECORD_CONTINUE, &[]));
        }
        let stream = parts.concat();

        let mut iter = LogicalBiffRecordIter::new(stream.as_slice(), |_| true);
        let err = iter.next().unwrap().unwrap_err();
        assert_eq!(
            err,
            StreamError::TooManyFragments {
                offset: 0,
                record_id: 0x00AA,
                cap: MAX_LOGICAL_RECORD_FRAGMENTS,
            }
        );
        assert!(iter.next().is_none());
    }

    #[test]
    fn assemble_concatenates_in_order() {
        assert_eq!(assemble(&[1, 2], &[&[3], &[], &[4, 5]]), vec![1, 2, 3, 4, 5]);
        assert_eq!(assemble(&[], &[]), Vec::<u8>::new());
    }

    #[test]
    fn disassemble_exact_multiple_has_no_empty_fragment() {
        let payload = vec![0xAB; 3 * 4];
        let fragments = disassemble(&payload, 4);
        assert_eq!(fragments.fragment_count(), 3);
        assert!(fragments.iter().all(|f| f.len() == 4));
    }

    #[test]
    fn disassemble_empty_payload_is_primary_only() {
        let fragments = disassemble(&[], MAX_RECORD_DATA_LEN);
        assert_eq!(fragments.fragment_count(), 1);
        assert!(fragments.primary.is_empty());
        assert!(fragments.continuations.is_empty());
    }

    #[test]
    fn disassemble_splits_at_max_record_size() {
        let payload: Vec<u8> = (0..MAX_RECORD_DATA_LEN + 10).map(|i| i as u8).collect();
        let fragments = disassemble(&payload, MAX_RECORD_DATA_LEN);
        assert_eq!(fragments.primary.len(), MAX_RECORD_DATA_LEN);
        assert_eq!(fragments.continuations.len(), 1);
        assert_eq!(fragments.continuations[0].len(), 10);
        assert_eq!(
            assemble(fragments.primary, &fragments.continuations),
            payload
        );
    }

    #[test]
    #[should_panic(expected = "max_fragment_len")]
    fn disassemble_rejects_zero_fragment_size() {
        let _ = disassemble(&[1, 2, 3], 0);
    }

    #[test]
    #[should_panic(expected = "max_fragment_len")]
    fn disassemble_rejects_oversized_fragment_size() {
        let _ = disassemble(&[1, 2, 3], MAX_RECORD_DATA_LEN + 1);
    }

    #[test]
    fn disassemble_with_sizes_reuses_matching_boundaries() {
        let payload = [1u8, 2, 3, 4, 5];
        let fragments = disassemble_with_sizes(&payload, &[2, 0, 3]);
        let pieces: Vec<&[u8]> = fragments.iter().collect();
        assert_eq!(pieces, vec![&[1u8, 2][..], &[][..], &[3, 4, 5][..]]);
    }

    #[test]
    fn disassemble_with_sizes_falls_back_when_length_changed() {
        let payload = [1u8, 2, 3, 4, 5, 6];
        let fragments = disassemble_with_sizes(&payload, &[2, 3]);
        assert_eq!(fragments.fragment_count(), 1);
        assert_eq!(fragments.primary, &payload);
    }

    #[test]
    fn disassemble_with_sizes_keeps_oversized_physical_records() {
        let payload = vec![0u8; MAX_RECORD_DATA_LEN + 1];
        let fragments = disassemble_with_sizes(&payload, &[MAX_RECORD_DATA_LEN + 1]);
        assert_eq!(fragments.fragment_count(), 1);

        let fragments = disassemble_with_sizes(&payload, &[]);
        assert_eq!(fragments.fragment_count(), 2);
    }

    #[test]
    fn write_to_emits_primary_then_continue_headers() {
        let payload = [1u8, 2, 3];
        let mut out = Vec::new();
        disassemble(&payload, 2).write_to(0x00AA, &mut out);
        assert_eq!(
            out,
            [record(0x00AA, &[1, 2]), record(RECORD_CONTINUE, &[3])].concat()
        );
    }
}
