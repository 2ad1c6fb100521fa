//! Cell addressing and the fields shared by single-cell records.

use std::cmp::Ordering;
use std::fmt;

use crate::error::RecordError;

use super::codec::{ensure_len, ensure_record_id, read_u16, CodecContext, RecordCodec};

/// BIFF8 worksheets hold at most 65,536 rows.
pub const MAX_ROWS: u32 = 65_536;
/// BIFF8 worksheets hold at most 256 columns (`A` through `IV`).
pub const MAX_COLS: u16 = 256;

pub(crate) const CELL_HEADER_LEN: usize = 6;

pub const RECORD_BLANK: u16 = 0x0201;

/// A zero-based cell position within BIFF8 sheet bounds.
///
/// The derived ordering is row-major; see [`CellAddress::cmp_column_major`] for the other one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellAddress {
    row: u32,
    col: u16,
}

impl CellAddress {
    pub fn new(row: u32, col: u16) -> Result<Self, RecordError> {
        if row >= MAX_ROWS || col >= MAX_COLS {
            return Err(RecordError::CellOutOfBounds {
                row,
                col: u32::from(col),
            });
        }
        Ok(Self { row, col })
    }

    /// For positions already validated as part of a group's column range.
    pub(crate) fn new_unchecked(row: u32, col: u16) -> Self {
        debug_assert!(row < MAX_ROWS && col < MAX_COLS);
        Self { row, col }
    }

    pub fn row(self) -> u32 {
        self.row
    }

    pub fn col(self) -> u16 {
        self.col
    }

    pub fn cmp_column_major(&self, other: &Self) -> Ordering {
        self.col
            .cmp(&other.col)
            .then_with(|| self.row.cmp(&other.row))
    }

    /// Address of the next column in the same row, if still inside the sheet.
    pub(crate) fn next_col(self) -> Option<Self> {
        Self::new(self.row, self.col.checked_add(1)?).ok()
    }
}

impl fmt::Display for CellAddress {
    /// A1-style reference, e.g. `C6` for row 5, column 2.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let col = self.col;
        if col >= 26 {
            write!(f, "{}", char::from(b'A' + (col / 26 - 1) as u8))?;
        }
        write!(f, "{}{}", char::from(b'A' + (col % 26) as u8), self.row + 1)
    }
}

/// Accessors shared by records describing exactly one cell.
pub trait CellRecord {
    fn address(&self) -> CellAddress;

    /// Index of the XF (extended format) record applied to the cell.
    fn xf_index(&self) -> u16;

    fn set_xf_index(&mut self, xf: u16);

    fn row(&self) -> u32 {
        self.address().row()
    }

    fn col(&self) -> u16 {
        self.address().col()
    }
}

/// The `[row: u16][col: u16][ixfe: u16]` prefix of every single-cell record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CellHeader {
    pub(crate) address: CellAddress,
    pub(crate) xf: u16,
}

impl CellHeader {
    pub(crate) fn decode(record_id: u16, data: &[u8]) -> Result<Self, RecordError> {
        ensure_len(record_id, data, CELL_HEADER_LEN)?;
        let row = read_u16(data, 0);
        let col = read_u16(data, 2);
        let address = CellAddress::new(u32::from(row), col)
            .map_err(|err| RecordError::malformed(record_id, err.to_string()))?;
        Ok(Self {
            address,
            xf: read_u16(data, 4),
        })
    }

    pub(crate) fn write_to(&self, out: &mut Vec<u8>) {
        // `CellAddress` keeps the row below 65536.
        out.extend_from_slice(&(self.address.row() as u16).to_le_bytes());
        out.extend_from_slice(&self.address.col().to_le_bytes());
        out.extend_from_slice(&self.xf.to_le_bytes());
    }
}

/// BLANK: a formatted cell with no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlankRecord {
    header: CellHeader,
    data: Vec<u8>,
}

impl BlankRecord {
    pub fn new(address: CellAddress, xf: u16) -> Self {
        let mut record = Self {
            header: CellHeader { address, xf },
            data: Vec::new(),
        };
        record.rebuild();
        record
    }

    fn rebuild(&mut self) {
        self.data.clear();
        self.header.write_to(&mut self.data);
    }
}

impl CellRecord for BlankRecord {
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

impl RecordCodec for BlankRecord {
    fn decode(record_id: u16, data: &[u8], _ctx: &CodecContext) -> Result<Self, RecordError> {
        ensure_record_id(RECORD_BLANK, record_id)?;
        let header = CellHeader::decode(record_id, data)?;
        Ok(Self {
            header,
            data: data.to_vec(),
        })
    }

    fn record_id(&self) -> u16 {
        RECORD_BLANK
    }

    fn payload(&self) -> &[u8] {
        &self.data
    }
}
