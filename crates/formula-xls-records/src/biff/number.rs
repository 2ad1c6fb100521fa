//! Numeric cells: NUMBER (full IEEE754 double) and RK (compressed).

use crate::error::RecordError;

use super::cell::{CellAddress, CellHeader, CellRecord, CELL_HEADER_LEN};
use super::codec::{ensure_len, ensure_record_id, read_f64, read_u32, CodecContext, RecordCodec};
use super::rk::{decode_rk_number, encode_rk_number};

pub const RECORD_NUMBER: u16 = 0x0203;
pub const RECORD_RK: u16 = 0x027E;

const NUMBER_LEN: usize = CELL_HEADER_LEN + 8;
const RK_LEN: usize = CELL_HEADER_LEN + 4;

/// Longest natural decimal rendering still displayed as an integer or plain float.
const DISPLAY_PRECISION_THRESHOLD: usize = 10;

/// How a numeric cell value is rendered as text.
///
/// Classification is purely presentational and never changes the stored bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericDisplay {
    Integer,
    Float,
    Double,
}

impl NumericDisplay {
    /// Classify by the length and suffix of the value's natural decimal text (`42.0`, `0.1`).
    pub fn classify(value: f64) -> Self {
        let text = format!("{value:?}");
        if text.len() > DISPLAY_PRECISION_THRESHOLD {
            NumericDisplay::Double
        } else if text.ends_with(".0") && value >= i32::MIN as f64 && value <= i32::MAX as f64 {
            NumericDisplay::Integer
        } else {
            NumericDisplay::Float
        }
    }

    pub fn render(self, value: f64) -> String {
        match self {
            NumericDisplay::Integer => (value as i32).to_string(),
            NumericDisplay::Float | NumericDisplay::Double => format!("{value:?}"),
        }
    }
}

/// NUMBER: a cell holding an IEEE754 double.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberRecord {
    header: CellHeader,
    value: f64,
    data: Vec<u8>,
}

impl NumberRecord {
    pub fn new(address: CellAddress, xf: u16, value: f64) -> Self {
        let mut record = Self {
            header: CellHeader { address, xf },
            value,
            data: Vec::with_capacity(NUMBER_LEN),
        };
        record.rebuild();
        record
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn set_value(&mut self, value: f64) {
        self.value = value;
        self.rebuild();
    }

    pub fn display(&self) -> NumericDisplay {
        NumericDisplay::classify(self.value)
    }

    /// The value rendered according to [`NumberRecord::display`].
    pub fn string_value(&self) -> String {
        self.display().render(self.value)
    }

    fn rebuild(&mut self) {
        self.data.clear();
        self.header.write_to(&mut self.data);
        self.data.extend_from_slice(&self.value.to_le_bytes());
    }
}

impl CellRecord for NumberRecord {
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

impl RecordCodec for NumberRecord {
    fn decode(record_id: u16, data: &[u8], _ctx: &CodecContext) -> Result<Self, RecordError> {
        ensure_record_id(RECORD_NUMBER, record_id)?;
        ensure_len(record_id, data, NUMBER_LEN)?;
        let header = CellHeader::decode(record_id, data)?;
        Ok(Self {
            header,
            value: read_f64(data, CELL_HEADER_LEN),
            data: data.to_vec(),
        })
    }

    fn record_id(&self) -> u16 {
        RECORD_NUMBER
    }

    fn payload(&self) -> &[u8] {
        &self.data
    }
}

/// RK: a cell holding a compressed numeric value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RkRecord {
    header: CellHeader,
    rk: u32,
    data: Vec<u8>,
}

impl RkRecord {
    /// Build a record from an already-encoded RK number.
    pub fn from_raw(address: CellAddress, xf: u16, rk: u32) -> Self {
        let mut record = Self {
            header: CellHeader { address, xf },
            rk,
            data: Vec::with_capacity(RK_LEN),
        };
        record.rebuild();
        record
    }

    pub fn new(address: CellAddress, xf: u16, value: f64) -> Result<Self, RecordError> {
        let rk = encode_rk_number(value).ok_or(RecordError::NotRkEncodable { value })?;
        Ok(Self::from_raw(address, xf, rk))
    }

    pub fn rk(&self) -> u32 {
        self.rk
    }

    pub fn value(&self) -> f64 {
        decode_rk_number(self.rk)
    }

    /// Store `value`, failing if the RK format cannot represent it exactly.
    pub fn set_value(&mut self, value: f64) -> Result<(), RecordError> {
        self.rk = encode_rk_number(value).ok_or(RecordError::NotRkEncodable { value })?;
        self.rebuild();
        Ok(())
    }

    pub fn display(&self) -> NumericDisplay {
        NumericDisplay::classify(self.value())
    }

    pub fn string_value(&self) -> String {
        self.display().render(self.value())
    }

    /// Widen into a NUMBER record for the same cell.
    pub fn to_number(&self) -> NumberRecord {
        NumberRecord::new(self.header.address, self.header.xf, self.value())
    }

    fn rebuild(&mut self) {
        self.data.clear();
        self.header.write_to(&mut self.data);
        self.data.extend_from_slice(&self.rk.to_le_bytes());
    }
}

impl CellRecord for RkRecord {
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

impl RecordCodec for RkRecord {
    fn decode(record_id: u16, data: &[u8], _ctx: &CodecContext) -> Result<Self, RecordError> {
        ensure_record_id(RECORD_RK, record_id)?;
        ensure_len(record_id, data, RK_LEN)?;
        let header = CellHeader::decode(record_id, data)?;
        Ok(Self {
            header,
            rk: read_u32(data, CELL_HEADER_LEN),
            data: data.to_vec(),
        })
    }

    fn record_id(&self) -> u16 {
        RECORD_RK
    }

    fn payload(&self) -> &[u8] {
        &self.data
    }
}
