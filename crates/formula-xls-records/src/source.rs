//! Random-access byte sources for record streams.
//!
//! Workbook streams live inside a compound file whose sectors are not necessarily contiguous on
//! disk. The record engine only ever sees a *virtual* contiguous span through [`ByteSource`]:
//! contiguous buffers borrow directly, while [`BlockSource`] stitches reads together from a list
//! of fixed-size storage blocks.

use std::borrow::Cow;

/// Read-only random access over a virtual contiguous byte span.
pub trait ByteSource {
    /// Total number of bytes addressable through this source.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the byte at `offset`, or `None` when out of bounds.
    fn read_u8(&self, offset: usize) -> Option<u8>;

    /// Read `len` bytes starting at `offset`.
    ///
    /// Returns `None` if any part of the requested range is out of bounds. Implementations borrow
    /// when the range is physically contiguous and copy otherwise.
    fn read_bytes(&self, offset: usize, len: usize) -> Option<Cow<'_, [u8]>>;
}

impl ByteSource for [u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn read_u8(&self, offset: usize) -> Option<u8> {
        self.get(offset).copied()
    }

    fn read_bytes(&self, offset: usize, len: usize) -> Option<Cow<'_, [u8]>> {
        let end = offset.checked_add(len)?;
        self.get(offset..end).map(Cow::Borrowed)
    }
}

impl ByteSource for Vec<u8> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn read_u8(&self, offset: usize) -> Option<u8> {
        self.as_slice().read_u8(offset)
    }

    fn read_bytes(&self, offset: usize, len: usize) -> Option<Cow<'_, [u8]>> {
        self.as_slice().read_bytes(offset, len)
    }
}

/// A byte source backed by a chain of equally-sized storage blocks.
///
/// Every block except the last holds exactly `block_len` bytes; the last block may be shorter.
/// This mirrors how a compound-file stream is laid out across sectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSource {
    blocks: Vec<Vec<u8>>,
    block_len: usize,
    len: usize,
}

impl BlockSource {
    /// Build a source from pre-split blocks.
    ///
    /// # Panics
    ///
    /// Panics if `block_len` is zero, if any block but the last is not exactly `block_len` bytes,
    /// or if the last block is empty or longer than `block_len`.
    pub fn new(blocks: Vec<Vec<u8>>, block_len: usize) -> Self {
        assert!(block_len > 0, "block_len must be non-zero");
        let mut len = 0usize;
        for (idx, block) in blocks.iter().enumerate() {
            let is_last = idx + 1 == blocks.len();
            if is_last {
                assert!(
                    !block.is_empty() && block.len() <= block_len,
                    "last block must hold 1..={block_len} bytes, got {}",
                    block.len()
                );
            } else {
                assert_eq!(
                    block.len(),
                    block_len,
                    "block {idx} must hold exactly {block_len} bytes"
                );
            }
            len += block.len();
        }
        Self {
            blocks,
            block_len,
            len,
        }
    }

    /// Split a contiguous buffer into blocks of `block_len` bytes.
    pub fn from_contiguous(bytes: &[u8], block_len: usize) -> Self {
        assert!(block_len > 0, "block_len must be non-zero");
        let blocks = bytes.chunks(block_len).map(<[u8]>::to_vec).collect();
        Self::new(blocks, block_len)
    }

    pub fn block_len(&self) -> usize {
        self.block_len
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Copy the whole span into one contiguous buffer.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len);
        for block in &self.blocks {
            out.extend_from_slice(block);
        }
        out
    }

    fn locate(&self, offset: usize) -> (usize, usize) {
        (offset / self.block_len, offset % self.block_len)
    }
}

impl ByteSource for BlockSource {
    fn len(&self) -> usize {
        self.len
    }

    fn read_u8(&self, offset: usize) -> Option<u8> {
        if offset >= self.len {
            return None;
        }
        let (block, within) = self.locate(offset);
        self.blocks.get(block)?.get(within).copied()
    }

    fn read_bytes(&self, offset: usize, len: usize) -> Option<Cow<'_, [u8]>> {
        let end = offset.checked_add(len)?;
        if end > self.len {
            return None;
        }
        if len == 0 {
            return Some(Cow::Borrowed(&[]));
        }

        let (first_block, within) = self.locate(offset);
        let first = self.blocks.get(first_block)?;
        if within + len <= first.len() {
            return Some(Cow::Borrowed(&first[within..within + len]));
        }

        let mut out = Vec::with_capacity(len);
        let mut block = first_block;
        let mut within = within;
        while out.len() < len {
            let data = self.blocks.get(block)?;
            let take = (len - out.len()).min(data.len() - within);
            out.extend_from_slice(&data[within..within + take]);
            block += 1;
            within = 0;
        }
        Some(Cow::Owned(out))
    }
}
