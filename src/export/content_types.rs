//! `[Content_Types].xml` patching.

use std::collections::BTreeSet;

use quick_xml::events::Event;
use quick_xml::{Reader, Writer};

use crate::error::{Result, XlembedError};
use crate::xml_helpers::{attr_string, element_prefix, xml_escape};

pub(crate) const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";

/// Content type entries the patched package needs.
#[derive(Debug, Default)]
pub(crate) struct ContentTypeEntries {
    /// `(extension, content type)` pairs, extension without the dot.
    pub defaults: Vec<(String, String)>,
    /// `(part name, content type)` pairs, part name with a leading `/`.
    pub overrides: Vec<(String, String)>,
}

impl ContentTypeEntries {
    pub fn add_default(&mut self, extension: &str, content_type: &str) {
        let extension = extension.to_ascii_lowercase();
        if !self.defaults.iter().any(|(ext, _)| *ext == extension) {
            self.defaults.push((extension, content_type.to_string()));
        }
    }

    pub fn add_override(&mut self, part_path: &str, content_type: &str) {
        let part_name = format!("/{}", part_path.trim_start_matches('/'));
        if !self.overrides.iter().any(|(name, _)| *name == part_name) {
            self.overrides.push((part_name, content_type.to_string()));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty() && self.overrides.is_empty()
    }
}

/// Add the missing `Default` and `Override` entries to `original`.
///
/// Extensions are compared case-insensitively, part names exactly. Entries
/// already present are left as they are.
pub(crate) fn patch_content_types(original: &[u8], entries: &ContentTypeEntries) -> Result<Vec<u8>> {
    let (known_exts, known_parts) = scan_existing(original)?;

    let mut reader = Reader::from_reader(original);
    reader.trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(original.len() + 512));

    let mut buf = Vec::new();
    let mut depth = 0u32;
    let mut prefix = None;
    let mut closed = false;

    loop {
        let event = reader.read_event_into(&mut buf)?;
        match event {
            Event::Start(ref e) => {
                if depth == 0 {
                    prefix = element_prefix(e);
                }
                depth += 1;
                writer.write_event(&event)?;
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 && !closed {
                    let missing = missing_entries(entries, &known_exts, &known_parts, prefix.as_deref());
                    writer.get_mut().extend_from_slice(missing.as_bytes());
                    closed = true;
                }
                writer.write_event(&event)?;
            }
            Event::Eof => break,
            _ => writer.write_event(&event)?,
        }
        buf.clear();
    }

    if !closed {
        return Err(XlembedError::Parse(format!(
            "{CONTENT_TYPES_PATH} has no <Types> element to extend"
        )));
    }
    Ok(writer.into_inner())
}

fn scan_existing(original: &[u8]) -> Result<(BTreeSet<String>, BTreeSet<String>)> {
    let mut reader = Reader::from_reader(original);
    reader.trim_text(true);

    let mut exts = BTreeSet::new();
    let mut parts = BTreeSet::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) => match e.local_name().as_ref() {
                b"Default" => {
                    if let Some(ext) = attr_string(e, b"Extension") {
                        exts.insert(ext.to_ascii_lowercase());
                    }
                }
                b"Override" => {
                    if let Some(name) = attr_string(e, b"PartName") {
                        parts.insert(name);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok((exts, parts))
}

fn missing_entries(
    entries: &ContentTypeEntries,
    known_exts: &BTreeSet<String>,
    known_parts: &BTreeSet<String>,
    prefix: Option<&str>,
) -> String {
    let qualify = |local: &str| match prefix {
        Some(p) => format!("{p}:{local}"),
        None => local.to_string(),
    };

    let mut out = String::new();
    for (ext, content_type) in &entries.defaults {
        if !known_exts.contains(ext) {
            out.push_str(&format!(
                r#"<{} Extension="{}" ContentType="{}"/>"#,
                qualify("Default"),
                xml_escape(ext),
                xml_escape(content_type)
            ));
        }
    }
    for (part_name, content_type) in &entries.overrides {
        if !known_parts.contains(part_name) {
            out.push_str(&format!(
                r#"<{} PartName="{}" ContentType="{}"/>"#,
                qualify("Override"),
                xml_escape(part_name),
                xml_escape(content_type)
            ));
        }
    }
    out
}
