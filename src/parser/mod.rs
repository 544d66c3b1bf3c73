//! XLSX loader
//!
//! Reads the active worksheet of a package into a [`Sheet`]: workbook
//! relationships, the sheet list, shared strings, the worksheet part and the
//! worksheet's own relationships (to find an existing drawing).

mod relationships;
mod worksheet;

use std::io::{BufReader, Cursor, Read, Seek};
use zip::ZipArchive;

use crate::error::{Result, XlembedError};
use crate::namespaces::is_drawing_relationship;
use crate::types::{DrawingLink, Sheet};

pub use relationships::{
    construct_rels_path, parse_relationships, parse_relationships_from, part_dir,
    relative_target, resolve_relative_path, Relationship, SheetInfo, WorkbookInfo,
};
use relationships::{find_workbook_path, parse_shared_strings, parse_workbook};
use worksheet::parse_sheet;

/// Load the active worksheet from XLSX bytes.
pub fn load_active_sheet(data: &[u8]) -> Result<Sheet> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    load_active_sheet_from(&mut archive)
}

/// Load the active worksheet from an open archive.
pub fn load_active_sheet_from<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Sheet> {
    let workbook_path = find_workbook_path(archive)?;
    let workbook = parse_workbook(archive, &workbook_path)?;
    let info = workbook
        .active_sheet()
        .cloned()
        .ok_or_else(|| XlembedError::Parse(format!("{workbook_path} lists no sheets")))?;
    let shared_strings = parse_shared_strings(archive, workbook.shared_strings.as_deref())?;

    log::debug!(
        "active sheet '{}' at {} ({} shared strings)",
        info.name,
        info.path,
        shared_strings.len()
    );

    let mut sheet = Sheet::new(info.name);
    sheet.path = info.path;

    let content = {
        let file = archive
            .by_name(&sheet.path)
            .map_err(|_| XlembedError::MissingPart(sheet.path.clone()))?;
        parse_sheet(BufReader::new(file), &mut sheet, &shared_strings)?
    };

    if let Some(rel_id) = content.drawing_rel_id {
        let rels = parse_relationships(archive, &construct_rels_path(&sheet.path))?;
        match rels
            .iter()
            .find(|rel| rel.id == rel_id && !rel.is_external())
        {
            Some(rel) if is_drawing_relationship(&rel.rel_type) => {
                sheet.drawing = Some(DrawingLink {
                    path: rel.resolve_target(part_dir(&sheet.path)),
                    rel_id,
                });
            }
            _ => log::warn!(
                "{}: <drawing r:id=\"{rel_id}\"> has no matching drawing relationship",
                sheet.path
            ),
        }
    }

    Ok(sheet)
}
