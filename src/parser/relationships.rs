//! Relationship parts, workbook sheet list and shared strings.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{BufReader, Read, Seek};
use zip::ZipArchive;

use crate::error::{Result, XlembedError};
use crate::namespaces::{
    is_shared_strings_relationship, is_worksheet_relationship, REL_OFFICE_DOCUMENT,
};
use crate::xml_helpers::{attr_rel_id, attr_string, attr_u32};

/// One `<Relationship>` of a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    /// `External` for targets outside the package.
    pub target_mode: Option<String>,
}

impl Relationship {
    pub fn is_external(&self) -> bool {
        self.target_mode.as_deref() == Some("External")
    }

    /// Package path of the target, resolved against the owning part's directory.
    pub fn resolve_target(&self, base_dir: &str) -> String {
        resolve_relative_path(base_dir, &self.target)
    }
}

/// Sheet entry from `xl/workbook.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetInfo {
    pub name: String,
    pub path: String,
}

/// The parts of `xl/workbook.xml` the loader needs.
#[derive(Debug, Clone, Default)]
pub struct WorkbookInfo {
    pub sheets: Vec<SheetInfo>,
    pub active_tab: usize,
    pub shared_strings: Option<String>,
}

impl WorkbookInfo {
    /// The sheet selected by `activeTab`, falling back to the first sheet.
    pub fn active_sheet(&self) -> Option<&SheetInfo> {
        self.sheets.get(self.active_tab).or_else(|| {
            log::warn!(
                "activeTab {} out of range for {} sheet(s), using the first sheet",
                self.active_tab,
                self.sheets.len()
            );
            self.sheets.first()
        })
    }
}

/// Construct the relationships file path from a file path
/// e.g., "xl/drawings/drawing1.xml" -> "xl/drawings/_rels/drawing1.xml.rels"
pub fn construct_rels_path(file_path: &str) -> String {
    match file_path.rsplit_once('/') {
        Some((dir, filename)) => format!("{dir}/_rels/{filename}.rels"),
        None => format!("_rels/{file_path}.rels"),
    }
}

/// Directory part of a package path ("" for root-level parts).
pub fn part_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Resolve a relative path against a base directory
///
/// Handles paths like "../media/image1.png" relative to "xl/drawings"
pub fn resolve_relative_path(base_dir: &str, relative: &str) -> String {
    if let Some(stripped) = relative.strip_prefix('/') {
        return stripped.to_string();
    }

    let mut components: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();

    for part in relative.split('/') {
        match part {
            ".." => {
                components.pop();
            }
            "." | "" => {}
            _ => components.push(part),
        }
    }

    components.join("/")
}

/// Relative reference from a part in `from_dir` to the package path `to`.
///
/// Inverse of [`resolve_relative_path`], used for new relationship targets.
pub fn relative_target(from_dir: &str, to: &str) -> String {
    let from: Vec<&str> = from_dir.split('/').filter(|s| !s.is_empty()).collect();
    let to_parts: Vec<&str> = to.split('/').filter(|s| !s.is_empty()).collect();

    let common = from
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let ups = from.len().saturating_sub(common);
    let mut parts: Vec<&str> = std::iter::repeat("..").take(ups).collect();
    parts.extend(to_parts.iter().skip(common));
    parts.join("/")
}

/// Parse a `.rels` part. A missing part yields no relationships.
pub fn parse_relationships<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    rels_path: &str,
) -> Result<Vec<Relationship>> {
    let Ok(file) = archive.by_name(rels_path) else {
        return Ok(Vec::new());
    };
    parse_relationships_from(BufReader::new(file))
}

/// Parse relationships from any XML source.
pub fn parse_relationships_from<B: std::io::BufRead>(reader: B) -> Result<Vec<Relationship>> {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut rels = Vec::new();
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Empty(ref e) | Event::Start(ref e) => {
                if e.local_name().as_ref() == b"Relationship" {
                    let id = attr_string(e, b"Id").unwrap_or_default();
                    let target = attr_string(e, b"Target").unwrap_or_default();
                    if !id.is_empty() && !target.is_empty() {
                        rels.push(Relationship {
                            id,
                            rel_type: attr_string(e, b"Type").unwrap_or_default(),
                            target,
                            target_mode: attr_string(e, b"TargetMode"),
                        });
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

/// Locate the workbook part through the package root relationships.
pub fn find_workbook_path<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<String> {
    let root = parse_relationships(archive, "_rels/.rels")?;
    let path = root
        .iter()
        .find(|rel| rel.rel_type == REL_OFFICE_DOCUMENT || rel.rel_type.ends_with("/officeDocument"))
        .map_or_else(|| "xl/workbook.xml".to_string(), |rel| rel.resolve_target(""));
    Ok(path)
}

/// Read sheet names/paths, the active tab and the shared strings location.
pub fn parse_workbook<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    workbook_path: &str,
) -> Result<WorkbookInfo> {
    let base_dir = part_dir(workbook_path);
    let rels = parse_relationships(archive, &construct_rels_path(workbook_path))?;

    let mut info = WorkbookInfo {
        shared_strings: rels
            .iter()
            .find(|rel| is_shared_strings_relationship(&rel.rel_type))
            .map(|rel| rel.resolve_target(base_dir)),
        ..WorkbookInfo::default()
    };

    let file = archive
        .by_name(workbook_path)
        .map_err(|_| XlembedError::MissingPart(workbook_path.to_string()))?;

    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(true);

    let mut buf = Vec::new();
    let mut seen_view = false;

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Empty(ref e) | Event::Start(ref e) => match e.local_name().as_ref() {
                b"workbookView" if !seen_view => {
                    seen_view = true;
                    info.active_tab = attr_u32(e, b"activeTab")
                        .and_then(|tab| usize::try_from(tab).ok())
                        .unwrap_or(0);
                }
                b"sheet" => {
                    let name = attr_string(e, b"name").unwrap_or_default();
                    let r_id = attr_rel_id(e).unwrap_or_default();
                    let path = rels
                        .iter()
                        .find(|rel| rel.id == r_id && is_worksheet_relationship(&rel.rel_type))
                        .map_or_else(
                            || {
                                let idx = info.sheets.len() + 1;
                                format!("xl/worksheets/sheet{idx}.xml")
                            },
                            |rel| rel.resolve_target(base_dir),
                        );
                    info.sheets.push(SheetInfo { name, path });
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(info)
}

/// Parse shared strings. Rich-text runs are concatenated; phonetic runs
/// (`<rPh>`) are skipped.
pub fn parse_shared_strings<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
) -> Result<Vec<String>> {
    let sst_path = path.unwrap_or("xl/sharedStrings.xml");
    let Ok(file) = archive.by_name(sst_path) else {
        return Ok(Vec::new());
    };

    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(false);

    let mut strings = Vec::new();
    let mut buf = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;
    let mut phonetic_depth = 0u32;

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"rPh" => phonetic_depth += 1,
                b"t" if in_si && phonetic_depth == 0 => in_t = true,
                _ => {}
            },
            Event::Empty(ref e) if e.local_name().as_ref() == b"si" => {
                strings.push(String::new());
            }
            Event::Text(ref e) if in_t => {
                current.push_str(&e.unescape()?);
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"si" => {
                    strings.push(std::mem::take(&mut current));
                    in_si = false;
                }
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                b"t" => in_t = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}
