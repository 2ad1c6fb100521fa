use crate::error::RecordError;

use super::codec::{CodecContext, RecordCodec};

/// A record this crate does not interpret. The payload passes through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueRecord {
    record_id: u16,
    data: Vec<u8>,
}

impl OpaqueRecord {
    pub fn new(record_id: u16, data: Vec<u8>) -> Self {
        Self { record_id, data }
    }

    pub fn set_payload(&mut self, data: Vec<u8>) {
        self.data = data;
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.data
    }
}

impl RecordCodec for OpaqueRecord {
    fn decode(record_id: u16, data: &[u8], _ctx: &CodecContext) -> Result<Self, RecordError> {
        Ok(Self::new(record_id, data.to_vec()))
    }

    fn record_id(&self) -> u16 {
        self.record_id
    }

    fn payload(&self) -> &[u8] {
        &self.data
    }
}
