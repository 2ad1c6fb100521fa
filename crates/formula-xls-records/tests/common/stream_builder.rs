#![allow(dead_code)]

use std::io::{Cursor, Write};

// Just enough BIFF8 to exercise record decoding. Keep record ids named so the intent stays
// readable.
pub const RECORD_BOF: u16 = 0x0809;
pub const RECORD_EOF: u16 = 0x000A;
pub const RECORD_CODEPAGE: u16 = 0x0042;
pub const RECORD_CONTINUE: u16 = 0x003C;
pub const RECORD_PROTECT: u16 = 0x0012;
pub const RECORD_PASSWORD: u16 = 0x0013;
pub const RECORD_SST: u16 = 0x00FC;
pub const RECORD_CRN: u16 = 0x005A;
pub const RECORD_MULRK: u16 = 0x00BD;
pub const RECORD_MULBLANK: u16 = 0x00BE;
pub const RECORD_DIMENSIONS: u16 = 0x0200;
pub const RECORD_BLANK: u16 = 0x0201;
pub const RECORD_NUMBER: u16 = 0x0203;
pub const RECORD_LABEL: u16 = 0x0204;
pub const RECORD_BOOLERR: u16 = 0x0205;
pub const RECORD_RK: u16 = 0x027E;

const BOF_VERSION_BIFF8: u16 = 0x0600;
pub const BOF_DT_WORKBOOK_GLOBALS: u16 = 0x0005;
pub const BOF_DT_WORKSHEET: u16 = 0x0010;

pub fn push_record(out: &mut Vec<u8>, id: u16, data: &[u8]) {
    out.extend_from_slice(&id.to_le_bytes());
    out.extend_from_slice(&(data.len() as u16).to_le_bytes());
    out.extend_from_slice(data);
}

pub fn bof(dt: u16) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[0..2].copy_from_slice(&BOF_VERSION_BIFF8.to_le_bytes());
    out[2..4].copy_from_slice(&dt.to_le_bytes());
    out[4..6].copy_from_slice(&0x0DBBu16.to_le_bytes()); // build
    out[6..8].copy_from_slice(&0x07CCu16.to_le_bytes()); // year (1996)
    out
}

fn cell_header(row: u16, col: u16, xf: u16) -> Vec<u8> {
    let mut out = Vec::with_capacity(6);
    out.extend_from_slice(&row.to_le_bytes());
    out.extend_from_slice(&col.to_le_bytes());
    out.extend_from_slice(&xf.to_le_bytes());
    out
}

pub fn number(row: u16, col: u16, xf: u16, value: f64) -> Vec<u8> {
    let mut out = cell_header(row, col, xf);
    out.extend_from_slice(&value.to_le_bytes());
    out
}

pub fn rk(row: u16, col: u16, xf: u16, rk: u32) -> Vec<u8> {
    let mut out = cell_header(row, col, xf);
    out.extend_from_slice(&rk.to_le_bytes());
    out
}

pub fn blank(row: u16, col: u16, xf: u16) -> Vec<u8> {
    cell_header(row, col, xf)
}

pub fn boolerr(row: u16, col: u16, xf: u16, value: u8, is_error: bool) -> Vec<u8> {
    let mut out = cell_header(row, col, xf);
    out.push(value);
    out.push(u8::from(is_error));
    out
}

/// LABEL with a compressed (8-bit) XLUnicodeString.
pub fn label(row: u16, col: u16, xf: u16, text: &str) -> Vec<u8> {
    let mut out = cell_header(row, col, xf);
    out.extend_from_slice(&(text.len() as u16).to_le_bytes());
    out.push(0);
    out.extend_from_slice(text.as_bytes());
    out
}

/// Integer RK value (`value << 2 | 0x02`).
pub fn rk_int(value: i32) -> u32 {
    ((value << 2) as u32) | 0x02
}

pub fn mulrk(row: u16, col_first: u16, entries: &[(u16, u32)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&row.to_le_bytes());
    out.extend_from_slice(&col_first.to_le_bytes());
    for (xf, rk) in entries {
        out.extend_from_slice(&xf.to_le_bytes());
        out.extend_from_slice(&rk.to_le_bytes());
    }
    let col_last = col_first + entries.len() as u16 - 1;
    out.extend_from_slice(&col_last.to_le_bytes());
    out
}

pub fn mulblank(row: u16, col_first: u16, xfs: &[u16]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&row.to_le_bytes());
    out.extend_from_slice(&col_first.to_le_bytes());
    for xf in xfs {
        out.extend_from_slice(&xf.to_le_bytes());
    }
    let col_last = col_first + xfs.len() as u16 - 1;
    out.extend_from_slice(&col_last.to_le_bytes());
    out
}

/// A small worksheet substream covering every typed cell record.
pub fn build_cells_sheet_stream() -> Vec<u8> {
    let mut out = Vec::new();
    push_record(&mut out, RECORD_BOF, &bof(BOF_DT_WORKSHEET));
    push_record(&mut out, RECORD_DIMENSIONS, &[0u8; 14]);
    push_record(&mut out, RECORD_NUMBER, &number(0, 0, 15, 42.0));
    push_record(&mut out, RECORD_LABEL, &label(0, 1, 15, "Hello"));
    push_record(&mut out, RECORD_BOOLERR, &boolerr(0, 2, 15, 1, false));
    push_record(&mut out, RECORD_BOOLERR, &boolerr(0, 3, 15, 0x07, true));
    push_record(&mut out, RECORD_RK, &rk(1, 0, 15, rk_int(7)));
    push_record(
        &mut out,
        RECORD_MULRK,
        &mulrk(2, 2, &[(15, rk_int(1)), (15, rk_int(2)), (16, rk_int(3)), (15, rk_int(4))]),
    );
    push_record(&mut out, RECORD_MULBLANK, &mulblank(3, 0, &[15, 15, 15]));
    push_record(&mut out, RECORD_BLANK, &blank(4, 4, 15));
    push_record(&mut out, RECORD_EOF, &[]);
    out
}

/// A workbook stream with a globals substream (code page, protection, a split SST) and one
/// worksheet.
pub fn build_workbook_stream() -> Vec<u8> {
    let mut out = Vec::new();
    push_record(&mut out, RECORD_BOF, &bof(BOF_DT_WORKBOOK_GLOBALS));
    push_record(&mut out, RECORD_CODEPAGE, &1252u16.to_le_bytes());
    push_record(&mut out, RECORD_PROTECT, &1u16.to_le_bytes());
    // "abc"
    push_record(&mut out, RECORD_PASSWORD, &0xCC1Au16.to_le_bytes());
    push_record(&mut out, RECORD_SST, &[1, 0, 0, 0, 1, 0, 0, 0, 3, 0]);
    push_record(&mut out, RECORD_CONTINUE, &[0, b'a', b'b', b'c']);
    push_record(&mut out, RECORD_EOF, &[]);
    out.extend_from_slice(&build_cells_sheet_stream());
    out
}

/// Wrap `workbook_stream` in a compound file under `stream_name`.
pub fn build_xls(stream_name: &str, workbook_stream: &[u8]) -> Vec<u8> {
    let cursor = Cursor::new(Vec::new());
    let mut ole = cfb::CompoundFile::create(cursor).expect("create cfb");
    {
        let mut stream = ole.create_stream(stream_name).expect("workbook stream");
        stream
            .write_all(workbook_stream)
            .expect("write workbook stream");
    }
    ole.into_inner().into_inner()
}
