//! Workbook/sheet protection records and the legacy password verifier.

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::RecordError;

use super::codec::{ensure_len, read_u16, CodecContext, RecordCodec};
use super::strings::encode_ansi;

pub const RECORD_PROTECT: u16 = 0x0012;
pub const RECORD_PASSWORD: u16 = 0x0013;
pub const RECORD_WINDOWPROTECT: u16 = 0x0019;
pub const RECORD_OBJPROTECT: u16 = 0x0063;
pub const RECORD_SCENPROTECT: u16 = 0x00DD;

const PASSWORD_HASH_KEY: u16 = 0xCE4B;

/// Hash a password with the legacy 16-bit protection verifier ([MS-XLS] 2.2.9).
///
/// The password is encoded in the workbook code page (unmappable characters become `?`), then
/// walked back to front. This is an obfuscation checksum, not a cryptographic hash; collisions
/// are common.
pub fn hash_password(password: &str, codepage: u16) -> u16 {
    let bytes = Zeroizing::new(encode_ansi(codepage, password).0);

    let mut hash: u16 = 0;
    for &byte in bytes.iter().rev() {
        hash ^= u16::from(byte);
        // Rotate within 15 bits.
        hash = ((hash << 1) & 0x7FFF) | ((hash >> 14) & 0x0001);
    }

    hash ^= bytes.len() as u16;
    hash ^= PASSWORD_HASH_KEY;
    hash
}

pub fn verify_password(password: &str, codepage: u16, stored: u16) -> bool {
    let computed = hash_password(password, codepage);
    bool::from(computed.ct_eq(&stored))
}

/// PASSWORD: the verifier of the sheet or workbook protection password (0 when unset).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordRecord {
    verifier: u16,
    codepage: u16,
    data: Vec<u8>,
}

impl PasswordRecord {
    pub fn new(verifier: u16, ctx: &CodecContext) -> Self {
        let mut record = Self {
            verifier,
            codepage: ctx.codepage,
            data: Vec::with_capacity(2),
        };
        record.rebuild();
        record
    }

    pub fn from_password(password: &str, ctx: &CodecContext) -> Self {
        Self::new(hash_password(password, ctx.codepage), ctx)
    }

    pub fn verifier(&self) -> u16 {
        self.verifier
    }

    pub fn set_verifier(&mut self, verifier: u16) {
        self.verifier = verifier;
        self.rebuild();
    }

    pub fn set_password(&mut self, password: &str) {
        self.set_verifier(hash_password(password, self.codepage));
    }

    pub fn verify(&self, password: &str) -> bool {
        verify_password(password, self.codepage, self.verifier)
    }

    fn rebuild(&mut self) {
        self.data.clear();
        self.data.extend_from_slice(&self.verifier.to_le_bytes());
    }
}

impl RecordCodec for PasswordRecord {
    fn decode(record_id: u16, data: &[u8], ctx: &CodecContext) -> Result<Self, RecordError> {
        if record_id != RECORD_PASSWORD {
            return Err(RecordError::malformed(record_id, "not a PASSWORD record"));
        }
        ensure_len(record_id, data, 2)?;
        Ok(Self {
            verifier: read_u16(data, 0),
            codepage: ctx.codepage,
            data: data.to_vec(),
        })
    }

    fn record_id(&self) -> u16 {
        RECORD_PASSWORD
    }

    fn payload(&self) -> &[u8] {
        &self.data
    }
}

/// Which protection flag a [`ProtectRecord`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtectKind {
    /// PROTECT: sheet or workbook structure.
    Protect,
    /// WINDOWPROTECT: workbook windows.
    Window,
    /// OBJPROTECT: drawing objects.
    Object,
    /// SCENPROTECT: scenarios.
    Scenario,
}

impl ProtectKind {
    pub fn record_id(self) -> u16 {
        match self {
            ProtectKind::Protect => RECORD_PROTECT,
            ProtectKind::Window => RECORD_WINDOWPROTECT,
            ProtectKind::Object => RECORD_OBJPROTECT,
            ProtectKind::Scenario => RECORD_SCENPROTECT,
        }
    }

    pub fn from_record_id(record_id: u16) -> Option<Self> {
        Some(match record_id {
            RECORD_PROTECT => ProtectKind::Protect,
            RECORD_WINDOWPROTECT => ProtectKind::Window,
            RECORD_OBJPROTECT => ProtectKind::Object,
            RECORD_SCENPROTECT => ProtectKind::Scenario,
            _ => return None,
        })
    }
}

/// A 2-byte protection flag record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectRecord {
    kind: ProtectKind,
    flag: u16,
    data: Vec<u8>,
}

impl ProtectRecord {
    pub fn new(kind: ProtectKind, protected: bool) -> Self {
        let mut record = Self {
            kind,
            flag: u16::from(protected),
            data: Vec::with_capacity(2),
        };
        record.rebuild();
        record
    }

    pub fn kind(&self) -> ProtectKind {
        self.kind
    }

    /// The raw flag; any non-zero value means protected.
    pub fn flag(&self) -> u16 {
        self.flag
    }

    pub fn is_protected(&self) -> bool {
        self.flag != 0
    }

    pub fn set_protected(&mut self, protected: bool) {
        self.flag = u16::from(protected);
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.data.clear();
        self.data.extend_from_slice(&self.flag.to_le_bytes());
    }
}

impl RecordCodec for ProtectRecord {
    fn decode(record_id: u16, data: &[u8], _ctx: &CodecContext) -> Result<Self, RecordError> {
        let kind = ProtectKind::from_record_id(record_id)
            .ok_or_else(|| RecordError::malformed(record_id, "not a protection record"))?;
        ensure_len(record_id, data, 2)?;
        Ok(Self {
            kind,
            flag: read_u16(data, 0),
            data: data.to_vec(),
        })
    }

    fn record_id(&self) -> u16 {
        self.kind.record_id()
    }

    fn payload(&self) -> &[u8] {
        &self.data
    }
}
