//! MULRK / MULBLANK: one record covering a run of adjacent cells in a single row.
//!
//! Layout: `[rw: u16][colFirst: u16][entry; colLast - colFirst + 1][colLast: u16]`. MULRK entries
//! are `[ixfe: u16][RK: u32]`, MULBLANK entries are a bare `ixfe: u16`.

use std::fmt;

use crate::error::RecordError;

use super::cell::{BlankRecord, CellAddress, CellRecord, MAX_COLS};
use super::codec::{ensure_len, ensure_record_id, read_u16, read_u32, CodecContext, RecordCodec};
use super::number::RkRecord;
use super::rk::{decode_rk_number, encode_rk_number};

pub const RECORD_MULRK: u16 = 0x00BD;
pub const RECORD_MULBLANK: u16 = 0x00BE;

/// One per-column entry of a multi-cell record.
pub trait MulCellEntry: Copy + fmt::Debug + PartialEq {
    const RECORD_ID: u16;
    /// Encoded size of one entry.
    const LEN: usize;

    /// The equivalent single-cell record.
    type Cell: CellRecord;

    /// Decode from exactly `LEN` bytes.
    fn read(bytes: &[u8]) -> Self;
    fn write_to(&self, out: &mut Vec<u8>);
    fn to_cell(self, address: CellAddress) -> Self::Cell;
    fn from_cell(cell: &Self::Cell) -> Self;
}

/// A MULRK entry: XF index plus an RK-compressed number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RkEntry {
    pub xf: u16,
    pub rk: u32,
}

impl RkEntry {
    pub fn new(xf: u16, value: f64) -> Result<Self, RecordError> {
        let rk = encode_rk_number(value).ok_or(RecordError::NotRkEncodable { value })?;
        Ok(Self { xf, rk })
    }

    pub fn value(&self) -> f64 {
        decode_rk_number(self.rk)
    }
}

impl MulCellEntry for RkEntry {
    const RECORD_ID: u16 = RECORD_MULRK;
    const LEN: usize = 6;
    type Cell = RkRecord;

    fn read(bytes: &[u8]) -> Self {
        Self {
            xf: read_u16(bytes, 0),
            rk: read_u32(bytes, 2),
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.xf.to_le_bytes());
        out.extend_from_slice(&self.rk.to_le_bytes());
    }

    fn to_cell(self, address: CellAddress) -> RkRecord {
        RkRecord::from_raw(address, self.xf, self.rk)
    }

    fn from_cell(cell: &RkRecord) -> Self {
        Self {
            xf: cell.xf_index(),
            rk: cell.rk(),
        }
    }
}

/// A MULBLANK entry: just the XF index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XfEntry {
    pub xf: u16,
}

impl MulCellEntry for XfEntry {
    const RECORD_ID: u16 = RECORD_MULBLANK;
    const LEN: usize = 2;
    type Cell = BlankRecord;

    fn read(bytes: &[u8]) -> Self {
        Self {
            xf: read_u16(bytes, 0),
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.xf.to_le_bytes());
    }

    fn to_cell(self, address: CellAddress) -> BlankRecord {
        BlankRecord::new(address, self.xf)
    }

    fn from_cell(cell: &BlankRecord) -> Self {
        Self {
            xf: cell.xf_index(),
        }
    }
}

/// A per-column view into a multi-cell record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellView<E> {
    pub address: CellAddress,
    pub entry: E,
}

impl<E> CellView<E> {
    pub fn row(&self) -> u32 {
        self.address.row()
    }

    pub fn col(&self) -> u16 {
        self.address.col()
    }
}

impl CellView<RkEntry> {
    pub fn value(&self) -> f64 {
        self.entry.value()
    }
}

/// A run of adjacent cells in one row, `col_first..=col_last`, one entry per column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MulCellRecord<E> {
    first: CellAddress,
    entries: Vec<E>,
    data: Vec<u8>,
}

pub type MulRkRecord = MulCellRecord<RkEntry>;
pub type MulBlankRecord = MulCellRecord<XfEntry>;

impl<E: MulCellEntry> MulCellRecord<E> {
    pub fn new(row: u32, col_first: u16, entries: Vec<E>) -> Result<Self, RecordError> {
        if entries.is_empty() {
            return Err(RecordError::malformed(
                E::RECORD_ID,
                "a multi-cell record needs at least one cell",
            ));
        }
        let first = CellAddress::new(row, col_first)?;
        let col_last = u32::from(col_first) + entries.len() as u32 - 1;
        if col_last >= u32::from(MAX_COLS) {
            return Err(RecordError::CellOutOfBounds { row, col: col_last });
        }
        let mut record = Self {
            first,
            entries,
            data: Vec::new(),
        };
        record.rebuild();
        Ok(record)
    }

    pub fn row(&self) -> u32 {
        self.first.row()
    }

    pub fn col_first(&self) -> u16 {
        self.first.col()
    }

    pub fn col_last(&self) -> u16 {
        // `new`/`decode` keep the whole range below MAX_COLS.
        self.first.col() + (self.entries.len() as u16 - 1)
    }

    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    pub fn cell_count(&self) -> usize {
        self.entries.len()
    }

    pub fn entry(&self, col: u16) -> Option<&E> {
        let idx = col.checked_sub(self.col_first())? as usize;
        self.entries.get(idx)
    }

    pub fn set_entry(&mut self, col: u16, entry: E) -> Result<(), RecordError> {
        let row = self.row();
        let idx = col
            .checked_sub(self.col_first())
            .map(usize::from)
            .filter(|idx| *idx < self.entries.len())
            .ok_or(RecordError::CellOutOfBounds {
                row,
                col: u32::from(col),
            })?;
        self.entries[idx] = entry;
        self.rebuild();
        Ok(())
    }

    /// One view per column, in column order.
    pub fn cells(&self) -> impl Iterator<Item = CellView<E>> + '_ {
        let row = self.row();
        let col_first = self.col_first();
        self.entries
            .iter()
            .enumerate()
            .map(move |(idx, entry)| CellView {
                address: CellAddress::new_unchecked(row, col_first + idx as u16),
                entry: *entry,
            })
    }

    /// Independent single-cell records, one per column.
    pub fn expand(&self) -> Vec<E::Cell> {
        self.cells()
            .map(|view| view.entry.to_cell(view.address))
            .collect()
    }

    /// Split into `[col_first, at - 1]` and `[at, col_last]`.
    pub fn split_at(&self, at: u16) -> Result<(Self, Self), RecordError> {
        let (col_first, col_last) = (self.col_first(), self.col_last());
        if at <= col_first || at > col_last {
            return Err(RecordError::InvalidSplit {
                col_first,
                col_last,
                at,
            });
        }
        let (left, right) = self.entries.split_at(usize::from(at - col_first));
        Ok((
            Self::new(self.row(), col_first, left.to_vec())?,
            Self::new(self.row(), at, right.to_vec())?,
        ))
    }

    /// Join two groups when `right` starts in the column after `left` ends.
    pub fn merge(left: &Self, right: &Self) -> Result<Self, RecordError> {
        if left.row() != right.row() {
            return Err(RecordError::NotAdjacent {
                reason: format!("rows differ ({} vs {})", left.row(), right.row()),
            });
        }
        if u32::from(left.col_last()) + 1 != u32::from(right.col_first()) {
            return Err(RecordError::NotAdjacent {
                reason: format!(
                    "columns {}..={} and {}..={} leave a gap or overlap",
                    left.col_first(),
                    left.col_last(),
                    right.col_first(),
                    right.col_last()
                ),
            });
        }
        let mut entries = Vec::with_capacity(left.entries.len() + right.entries.len());
        entries.extend_from_slice(&left.entries);
        entries.extend_from_slice(&right.entries);
        Self::new(left.row(), left.col_first(), entries)
    }

    /// Group single-cell records into runs of adjacent cells.
    ///
    /// Cells are ordered row-major first; each maximal run of consecutive columns in one row
    /// becomes one group (possibly of a single cell). Two cells at the same address are an error.
    pub fn compress(cells: &[E::Cell]) -> Result<Vec<Self>, RecordError> {
        let mut sorted: Vec<(CellAddress, E)> = cells
            .iter()
            .map(|cell| (cell.address(), E::from_cell(cell)))
            .collect();
        sorted.sort_by_key(|(address, _)| *address);

        let mut groups = Vec::new();
        let mut run: Option<(CellAddress, CellAddress, Vec<E>)> = None;
        for (address, entry) in sorted {
            if let Some((_, last, entries)) = run.as_mut() {
                if *last == address {
                    return Err(RecordError::NotAdjacent {
                        reason: format!("duplicate cell {address}"),
                    });
                }
                if last.next_col() == Some(address) {
                    *last = address;
                    entries.push(entry);
                    continue;
                }
            }
            if let Some((first, _, entries)) = run.replace((address, address, vec![entry])) {
                groups.push(Self::new(first.row(), first.col(), entries)?);
            }
        }
        if let Some((first, _, entries)) = run {
            groups.push(Self::new(first.row(), first.col(), entries)?);
        }
        Ok(groups)
    }

    fn rebuild(&mut self) {
        self.data.clear();
        self.data.reserve(4 + self.entries.len() * E::LEN + 2);
        self.data.extend_from_slice(&(self.row() as u16).to_le_bytes());
        self.data.extend_from_slice(&self.col_first().to_le_bytes());
        for entry in &self.entries {
            entry.write_to(&mut self.data);
        }
        self.data.extend_from_slice(&self.col_last().to_le_bytes());
    }
}

impl<E: MulCellEntry> RecordCodec for MulCellRecord<E> {
    fn decode(record_id: u16, data: &[u8], _ctx: &CodecContext) -> Result<Self, RecordError> {
        ensure_record_id(E::RECORD_ID, record_id)?;
        ensure_len(record_id, data, 4 + E::LEN + 2)?;

        let row = read_u16(data, 0);
        let col_first = read_u16(data, 2);
        let col_last = read_u16(data, data.len() - 2);

        let area = &data[4..data.len() - 2];
        if area.len() % E::LEN != 0 {
            return Err(RecordError::malformed(
                record_id,
                format!(
                    "entry area of {} bytes is not a multiple of {}",
                    area.len(),
                    E::LEN
                ),
            ));
        }
        let count = area.len() / E::LEN;
        if col_last < col_first || usize::from(col_last - col_first) + 1 != count {
            return Err(RecordError::malformed(
                record_id,
                format!("columns {col_first}..={col_last} do not match {count} entries"),
            ));
        }
        let first = CellAddress::new(u32::from(row), col_first)
            .map_err(|err| RecordError::malformed(record_id, err.to_string()))?;
        if col_last >= MAX_COLS {
            return Err(RecordError::malformed(
                record_id,
                format!("column {col_last} is outside the sheet"),
            ));
        }

        let entries = area.chunks_exact(E::LEN).map(E::read).collect();
        Ok(Self {
            first,
            entries,
            data: data.to_vec(),
        })
    }

    fn record_id(&self) -> u16 {
        E::RECORD_ID
    }

    fn payload(&self) -> &[u8] {
        &self.data
    }
}
