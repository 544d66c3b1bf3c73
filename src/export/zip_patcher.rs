//! Patch an XLSX ZIP archive with the embedded images of one worksheet.
//!
//! Unmodified entries are copied via `raw_copy_file` (zero recompression cost).
//! Rewritten parts replace their original entry in place; new parts (media,
//! a new drawing and new `.rels` files) are appended at the end.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read, Seek, Write};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::{Result, XlembedError};
use crate::namespaces::{CT_DRAWING, CT_RELATIONSHIPS, REL_DRAWING, REL_IMAGE};
use crate::parser::{construct_rels_path, parse_relationships, part_dir, relative_target};
use crate::types::Sheet;

use super::content_types::{patch_content_types, ContentTypeEntries, CONTENT_TYPES_PATH};
use super::drawing_writer::{append_to_drawing_xml, new_drawing_xml, PictureAnchor};
use super::rels_writer::RelationshipSet;
use super::sheet_patcher::patch_worksheet;

/// Parts to write in place of, or next to, the original entries.
#[derive(Default)]
struct PackageChanges {
    replaced: BTreeMap<String, Vec<u8>>,
    added: Vec<(String, Vec<u8>)>,
}

impl PackageChanges {
    fn put(&mut self, path: String, data: Vec<u8>, existing: &BTreeSet<String>) {
        if existing.contains(&path) {
            self.replaced.insert(path, data);
        } else {
            self.added.push((path, data));
        }
    }
}

/// Patch the original XLSX bytes with the sheet's pending changes.
///
/// Returns the new XLSX file as `Vec<u8>`.
pub(crate) fn patch_zip(original_data: &[u8], sheet: &Sheet) -> Result<Vec<u8>> {
    let cursor = Cursor::new(original_data);
    let mut archive = ZipArchive::new(cursor)?;
    let existing: BTreeSet<String> = archive.file_names().map(ToString::to_string).collect();

    let mut changes = PackageChanges::default();
    let mut new_drawing_rel_id = None;

    if !sheet.images().is_empty() {
        new_drawing_rel_id = add_images(&mut archive, sheet, &existing, &mut changes)?;
    }

    if sheet.is_modified() {
        let original_sheet = read_entry(&mut archive, &sheet.path)?;
        let patched = patch_worksheet(&original_sheet, sheet, new_drawing_rel_id.as_deref())?;
        changes.replaced.insert(sheet.path.clone(), patched);
    }

    log::debug!(
        "writing package: {} part(s) replaced, {} added",
        changes.replaced.len(),
        changes.added.len()
    );

    let buf: Vec<u8> = Vec::with_capacity(original_data.len() + sheet.images().len() * 16 * 1024);
    let mut writer = ZipWriter::new(Cursor::new(buf));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        let name = entry.name().to_string();
        if let Some(data) = changes.replaced.get(&name) {
            writer.start_file(name, options)?;
            writer.write_all(data)?;
        } else {
            // Pass through unmodified entry (raw copy, no re-compression)
            writer.raw_copy_file(entry)?;
        }
    }

    for (name, data) in &changes.added {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(data)?;
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

/// Stage media, drawing, relationship and content type parts for the
/// sheet's images. Returns the sheet relationship id of a newly created
/// drawing, or `None` when the images join an existing drawing.
fn add_images<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    sheet: &Sheet,
    existing: &BTreeSet<String>,
    changes: &mut PackageChanges,
) -> Result<Option<String>> {
    let mut allocator = PartAllocator::new(existing);
    let mut content_types = ContentTypeEntries::default();

    let existing_drawing = sheet
        .drawing
        .as_ref()
        .filter(|link| existing.contains(&link.path));
    if let Some(link) = sheet.drawing.as_ref().filter(|_| existing_drawing.is_none()) {
        log::warn!(
            "{}: drawing part {} is missing, creating a new one",
            sheet.path,
            link.path
        );
    }

    let drawing_path = match existing_drawing {
        Some(link) => link.path.clone(),
        None => allocator.allocate("xl/drawings/drawing", "xml"),
    };
    let drawing_dir = part_dir(&drawing_path).to_string();

    // Image relationships of the drawing part.
    let drawing_rels_path = construct_rels_path(&drawing_path);
    let mut drawing_rels = if existing_drawing.is_some() {
        RelationshipSet::new(parse_relationships(archive, &drawing_rels_path)?)
    } else {
        RelationshipSet::default()
    };

    let mut embed_ids = Vec::with_capacity(sheet.images().len());
    for image in sheet.images() {
        let extension = image.format.extension();
        let media_path = allocator.allocate("xl/media/image", extension);
        embed_ids.push(drawing_rels.add(REL_IMAGE, relative_target(&drawing_dir, &media_path)));
        content_types.add_default(extension, image.format.mime_type());
        changes.put(media_path, image.image_bytes.clone(), existing);
    }

    let pictures: Vec<PictureAnchor<'_>> = sheet
        .images()
        .iter()
        .zip(&embed_ids)
        .map(|(instruction, embed_rel_id)| PictureAnchor {
            instruction,
            embed_rel_id,
        })
        .collect();

    let drawing_xml = match existing_drawing {
        Some(link) => append_to_drawing_xml(&read_entry(archive, &link.path)?, &pictures)?,
        None => new_drawing_xml(&pictures).into_bytes(),
    };
    changes.put(drawing_path.clone(), drawing_xml, existing);
    changes.put(drawing_rels_path, drawing_rels.to_xml().into_bytes(), existing);
    content_types.add_default("rels", CT_RELATIONSHIPS);

    let mut new_drawing_rel_id = None;
    if existing_drawing.is_none() {
        let sheet_rels_path = construct_rels_path(&sheet.path);
        let mut sheet_rels = RelationshipSet::new(parse_relationships(archive, &sheet_rels_path)?);
        let rel_id = sheet_rels.add(
            REL_DRAWING,
            relative_target(part_dir(&sheet.path), &drawing_path),
        );
        changes.put(sheet_rels_path, sheet_rels.to_xml().into_bytes(), existing);
        content_types.add_override(&drawing_path, CT_DRAWING);
        new_drawing_rel_id = Some(rel_id);
    }

    let types = read_entry(archive, CONTENT_TYPES_PATH)?;
    changes.replaced.insert(
        CONTENT_TYPES_PATH.to_string(),
        patch_content_types(&types, &content_types)?,
    );

    Ok(new_drawing_rel_id)
}

/// Hands out part names of the form `{stem}{n}.{ext}` not present in the package.
///
/// Names compare case-insensitively. Each `(stem, ext)` pair resumes from
/// the number after its last allocation.
struct PartAllocator {
    used: BTreeSet<String>,
    next: BTreeMap<(String, String), u32>,
}

impl PartAllocator {
    fn new(existing: &BTreeSet<String>) -> Self {
        Self {
            used: existing.iter().map(|name| name.to_ascii_lowercase()).collect(),
            next: BTreeMap::new(),
        }
    }

    fn allocate(&mut self, stem: &str, extension: &str) -> String {
        let key = (stem.to_ascii_lowercase(), extension.to_ascii_lowercase());
        let mut n = self.next.get(&key).copied().unwrap_or(1);
        loop {
            let candidate = format!("{stem}{n}.{extension}");
            n = n.saturating_add(1);
            if self.used.insert(candidate.to_ascii_lowercase()) {
                self.next.insert(key, n);
                return candidate;
            }
        }
    }
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<Vec<u8>> {
    let mut file = archive
        .by_name(path)
        .map_err(|_| XlembedError::MissingPart(path.to_string()))?;
    let mut data = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
    file.read_to_end(&mut data)?;
    Ok(data)
}
