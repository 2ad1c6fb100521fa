//! Compound-file adapter: exposes the workbook stream of an `.xls` file as a [`BlockSource`].

use std::io::{Read, Seek};
use std::path::Path;

use crate::error::ContainerError;
use crate::source::BlockSource;

/// Block size used when copying a workbook stream out of the compound file (one regular sector).
pub const WORKBOOK_BLOCK_LEN: usize = 512;

/// Open the BIFF workbook stream (`Workbook` for BIFF8, `Book` for BIFF5).
pub fn open_xls_workbook_stream<R: Read + Seek>(
    comp: &mut cfb::CompoundFile<R>,
) -> Result<cfb::Stream<R>, ContainerError> {
    for candidate in ["/Workbook", "/Book", "Workbook", "Book"] {
        if let Ok(stream) = comp.open_stream(candidate) {
            return Ok(stream);
        }
    }
    Err(ContainerError::MissingWorkbookStream)
}

/// Read the workbook stream of a compound file held by `reader`.
pub fn read_workbook_stream<R: Read + Seek>(reader: R) -> Result<BlockSource, ContainerError> {
    let mut comp = cfb::CompoundFile::open(reader)?;
    let stream = open_xls_workbook_stream(&mut comp)?;
    read_blocks(stream)
}

/// Read the workbook stream of the `.xls` file at `path`.
pub fn read_workbook_stream_from_xls(path: impl AsRef<Path>) -> Result<BlockSource, ContainerError> {
    let mut comp = cfb::open(path)?;
    let stream = open_xls_workbook_stream(&mut comp)?;
    read_blocks(stream)
}

fn read_blocks<R: Read>(mut stream: R) -> Result<BlockSource, ContainerError> {
    let mut blocks = Vec::new();
    loop {
        let mut block = Vec::with_capacity(WORKBOOK_BLOCK_LEN);
        (&mut stream)
            .take(WORKBOOK_BLOCK_LEN as u64)
            .read_to_end(&mut block)?;
        if block.is_empty() {
            break;
        }
        let short = block.len() < WORKBOOK_BLOCK_LEN;
        blocks.push(block);
        if short {
            break;
        }
    }
    log::debug!("read workbook stream: {} blocks", blocks.len());
    Ok(BlockSource::new(blocks, WORKBOOK_BLOCK_LEN))
}
