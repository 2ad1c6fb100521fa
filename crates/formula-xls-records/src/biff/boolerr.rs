//! BOOLERR: a cell holding a boolean or an error constant.

use crate::error::RecordError;

use super::cell::{CellAddress, CellHeader, CellRecord, CELL_HEADER_LEN};
use super::codec::{ensure_len, ensure_record_id, CodecContext, RecordCodec};

pub const RECORD_BOOLERR: u16 = 0x0205;

const BOOLERR_LEN: usize = CELL_HEADER_LEN + 2;

/// BIFF error codes ([MS-XLS] 2.5.10 `BErr`) and their display labels.
const ERROR_LABELS: &[(u8, &str)] = &[
    (0x00, "#NULL!"),
    (0x07, "#DIV/0!"),
    (0x0F, "#VALUE!"),
    (0x17, "#REF!"),
    (0x1D, "#NAME?"),
    (0x24, "#NUM!"),
    (0x2A, "#N/A"),
];

/// Display label for a BIFF error code; unknown codes map to an empty label.
pub fn error_label(code: u8) -> &'static str {
    ERROR_LABELS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| *label)
        .unwrap_or("")
}

/// Error code for a display label, if it is one of the BIFF error constants.
pub fn error_code(label: &str) -> Option<u8> {
    ERROR_LABELS
        .iter()
        .find(|(_, l)| *l == label)
        .map(|(code, _)| *code)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolErrValue {
    Bool(bool),
    Error(u8),
}

impl BoolErrValue {
    fn to_bytes(self) -> [u8; 2] {
        match self {
            BoolErrValue::Bool(value) => [u8::from(value), 0],
            BoolErrValue::Error(code) => [code, 1],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoolErrRecord {
    header: CellHeader,
    value: BoolErrValue,
    data: Vec<u8>,
}

impl BoolErrRecord {
    pub fn new(address: CellAddress, xf: u16, value: BoolErrValue) -> Self {
        let mut record = Self {
            header: CellHeader { address, xf },
            value,
            data: Vec::with_capacity(BOOLERR_LEN),
        };
        record.rebuild();
        record
    }

    pub fn value(&self) -> BoolErrValue {
        self.value
    }

    pub fn is_error(&self) -> bool {
        matches!(self.value, BoolErrValue::Error(_))
    }

    /// The error label (`#DIV/0!`, ...) for error cells; empty for unknown codes and booleans.
    pub fn error_label(&self) -> &'static str {
        match self.value {
            BoolErrValue::Error(code) => error_label(code),
            BoolErrValue::Bool(_) => "",
        }
    }

    /// `TRUE`/`FALSE` for booleans, the error label otherwise.
    pub fn string_value(&self) -> String {
        match self.value {
            BoolErrValue::Bool(true) => "TRUE".to_string(),
            BoolErrValue::Bool(false) => "FALSE".to_string(),
            BoolErrValue::Error(code) => error_label(code).to_string(),
        }
    }

    pub fn set_value(&mut self, value: BoolErrValue) {
        self.value = value;
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.data.clear();
        self.header.write_to(&mut self.data);
        self.data.extend_from_slice(&self.value.to_bytes());
    }
}

impl CellRecord for BoolErrRecord {
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

impl RecordCodec for BoolErrRecord {
    fn decode(record_id: u16, data: &[u8], _ctx: &CodecContext) -> Result<Self, RecordError> {
        ensure_record_id(RECORD_BOOLERR, record_id)?;
        ensure_len(record_id, data, BOOLERR_LEN)?;
        let header = CellHeader::decode(record_id, data)?;
        let raw = data[CELL_HEADER_LEN];
        let value = if data[CELL_HEADER_LEN + 1] != 0 {
            BoolErrValue::Error(raw)
        } else {
            BoolErrValue::Bool(raw != 0)
        };
        Ok(Self {
            header,
            value,
            data: data.to_vec(),
        })
    }

    fn record_id(&self) -> u16 {
        RECORD_BOOLERR
    }

    fn payload(&self) -> &[u8] {
        &self.data
    }
}
