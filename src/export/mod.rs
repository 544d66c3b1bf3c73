//! XLSX export pipeline.
//!
//! Produces the output package by patching the original ZIP archive.
//! Only the active worksheet and the parts that carry its images are
//! rewritten; everything else is passed through byte-identical.

pub(crate) mod content_types;
pub(crate) mod drawing_writer;
pub(crate) mod rels_writer;
pub(crate) mod sheet_patcher;
pub(crate) mod zip_patcher;

use crate::error::Result;
use crate::types::Sheet;

pub use drawing_writer::EMU_PER_PIXEL;

/// Save a worksheet's pending changes into a copy of `original_bytes`.
///
/// Returns the new XLSX file as `Vec<u8>`; an unmodified sheet yields the
/// original bytes.
pub fn save_xlsx(original_bytes: &[u8], sheet: &Sheet) -> Result<Vec<u8>> {
    if !sheet.is_modified() {
        return Ok(original_bytes.to_vec());
    }

    zip_patcher::patch_zip(original_bytes, sheet)
}
