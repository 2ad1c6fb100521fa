//! Opcode dispatch.
//!
//! [`lookup`] maps a record id to the codec responsible for it through a compile-time table;
//! [`Record`] is the sum of every typed record plus an opaque passthrough for everything else.

use crate::error::{DecodeWarning, RecordError};

use super::boolerr::{BoolErrRecord, RECORD_BOOLERR};
use super::cell::{BlankRecord, CellRecord, RECORD_BLANK};
use super::codec::{CodecContext, RecordCodec};
use super::crn::{CrnRecord, RECORD_CRN};
use super::label::{LabelRecord, RECORD_LABEL};
use super::mulcell::{MulBlankRecord, MulRkRecord, RECORD_MULBLANK, RECORD_MULRK};
use super::number::{NumberRecord, RkRecord, RECORD_NUMBER, RECORD_RK};
use super::opaque::OpaqueRecord;
use super::protection::{
    PasswordRecord, ProtectKind, ProtectRecord, RECORD_OBJPROTECT, RECORD_PASSWORD,
    RECORD_PROTECT, RECORD_SCENPROTECT, RECORD_WINDOWPROTECT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Blank,
    Number,
    Label,
    BoolErr,
    Rk,
    MulRk,
    MulBlank,
    Crn,
    Password,
    Protect(ProtectKind),
    Opaque,
}

// Sorted by record id.
static REGISTRY: &[(u16, RecordKind)] = &[
    (RECORD_PROTECT, RecordKind::Protect(ProtectKind::Protect)),
    (RECORD_PASSWORD, RecordKind::Password),
    (RECORD_WINDOWPROTECT, RecordKind::Protect(ProtectKind::Window)),
    (RECORD_CRN, RecordKind::Crn),
    (RECORD_OBJPROTECT, RecordKind::Protect(ProtectKind::Object)),
    (RECORD_MULRK, RecordKind::MulRk),
    (RECORD_MULBLANK, RecordKind::MulBlank),
    (RECORD_SCENPROTECT, RecordKind::Protect(ProtectKind::Scenario)),
    (RECORD_BLANK, RecordKind::Blank),
    (RECORD_NUMBER, RecordKind::Number),
    (RECORD_LABEL, RecordKind::Label),
    (RECORD_BOOLERR, RecordKind::BoolErr),
    (RECORD_RK, RecordKind::Rk),
];

/// The codec registered for `record_id`; unregistered ids are [`RecordKind::Opaque`].
pub fn lookup(record_id: u16) -> RecordKind {
    REGISTRY
        .binary_search_by_key(&record_id, |(id, _)| *id)
        .map(|idx| REGISTRY[idx].1)
        .unwrap_or(RecordKind::Opaque)
}

/// Every record id with a typed codec, in ascending order.
pub fn registered_record_ids() -> impl Iterator<Item = u16> {
    REGISTRY.iter().map(|(id, _)| *id)
}

/// A decoded record of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Blank(BlankRecord),
    Number(NumberRecord),
    Label(LabelRecord),
    BoolErr(BoolErrRecord),
    Rk(RkRecord),
    MulRk(MulRkRecord),
    MulBlank(MulBlankRecord),
    Crn(CrnRecord),
    Password(PasswordRecord),
    Protect(ProtectRecord),
    Opaque(OpaqueRecord),
}

macro_rules! with_record {
    ($record:expr, $inner:ident => $body:expr) => {
        match $record {
            Record::Blank($inner) => $body,
            Record::Number($inner) => $body,
            Record::Label($inner) => $body,
            Record::BoolErr($inner) => $body,
            Record::Rk($inner) => $body,
            Record::MulRk($inner) => $body,
            Record::MulBlank($inner) => $body,
            Record::Crn($inner) => $body,
            Record::Password($inner) => $body,
            Record::Protect($inner) => $body,
            Record::Opaque($inner) => $body,
        }
    };
}

impl Record {
    /// Decode a logical payload with the codec registered for `record_id`.
    pub fn decode(record_id: u16, data: &[u8], ctx: &CodecContext) -> Result<Self, RecordError> {
        Ok(match lookup(record_id) {
            RecordKind::Blank => Record::Blank(BlankRecord::decode(record_id, data, ctx)?),
            RecordKind::Number => Record::Number(NumberRecord::decode(record_id, data, ctx)?),
            RecordKind::Label => Record::Label(LabelRecord::decode(record_id, data, ctx)?),
            RecordKind::BoolErr => Record::BoolErr(BoolErrRecord::decode(record_id, data, ctx)?),
            RecordKind::Rk => Record::Rk(RkRecord::decode(record_id, data, ctx)?),
            RecordKind::MulRk => Record::MulRk(MulRkRecord::decode(record_id, data, ctx)?),
            RecordKind::MulBlank => {
                Record::MulBlank(MulBlankRecord::decode(record_id, data, ctx)?)
            }
            RecordKind::Crn => Record::Crn(CrnRecord::decode(record_id, data, ctx)?),
            RecordKind::Password => {
                Record::Password(PasswordRecord::decode(record_id, data, ctx)?)
            }
            RecordKind::Protect(_) => Record::Protect(ProtectRecord::decode(record_id, data, ctx)?),
            RecordKind::Opaque => Record::Opaque(OpaqueRecord::decode(record_id, data, ctx)?),
        })
    }

    /// Keep `data` uninterpreted regardless of `record_id`.
    pub fn opaque(record_id: u16, data: &[u8]) -> Self {
        Record::Opaque(OpaqueRecord::new(record_id, data.to_vec()))
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Blank(_) => RecordKind::Blank,
            Record::Number(_) => RecordKind::Number,
            Record::Label(_) => RecordKind::Label,
            Record::BoolErr(_) => RecordKind::BoolErr,
            Record::Rk(_) => RecordKind::Rk,
            Record::MulRk(_) => RecordKind::MulRk,
            Record::MulBlank(_) => RecordKind::MulBlank,
            Record::Crn(_) => RecordKind::Crn,
            Record::Password(_) => RecordKind::Password,
            Record::Protect(record) => RecordKind::Protect(record.kind()),
            Record::Opaque(_) => RecordKind::Opaque,
        }
    }

    pub fn record_id(&self) -> u16 {
        with_record!(self, record => record.record_id())
    }

    pub fn payload(&self) -> &[u8] {
        with_record!(self, record => record.payload())
    }

    pub fn encode(&self) -> Vec<u8> {
        with_record!(self, record => record.encode())
    }

    pub fn warnings(&self) -> &[DecodeWarning] {
        with_record!(self, record => record.warnings())
    }

    /// The shared cell accessors, for records describing exactly one cell.
    pub fn as_cell(&self) -> Option<&dyn CellRecord> {
        match self {
            Record::Blank(record) => Some(record),
            Record::Number(record) => Some(record),
            Record::Label(record) => Some(record),
            Record::BoolErr(record) => Some(record),
            Record::Rk(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_cell_mut(&mut self) -> Option<&mut dyn CellRecord> {
        match self {
            Record::Blank(record) => Some(record),
            Record::Number(record) => Some(record),
            Record::Label(record) => Some(record),
            Record::BoolErr(record) => Some(record),
            Record::Rk(record) => Some(record),
            _ => None,
        }
    }
}
