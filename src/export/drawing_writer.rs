//! SpreadsheetML drawing parts.
//!
//! Each embedded image is an `xdr:oneCellAnchor`: its top-left corner is
//! pinned to the anchor cell and its extent is the thumbnail size in EMU, so
//! the picture keeps its size when rows and columns are resized.

use quick_xml::events::Event;
use quick_xml::{Reader, Writer};

use crate::error::{Result, XlembedError};
use crate::namespaces::{NS_DRAWING, NS_DRAWING_SPREADSHEET, NS_OFFICE_RELATIONSHIPS};
use crate::plan::PlacementInstruction;
use crate::xml_helpers::{attr_u32, xml_escape};

/// English Metric Units per pixel at 96 DPI.
pub const EMU_PER_PIXEL: u64 = 9525;

/// One picture to write, with its image relationship already allocated.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PictureAnchor<'a> {
    pub instruction: &'a PlacementInstruction,
    pub embed_rel_id: &'a str,
}

/// A new drawing part holding `pictures`.
pub(crate) fn new_drawing_xml(pictures: &[PictureAnchor<'_>]) -> String {
    let mut out = String::with_capacity(512 + pictures.len() * 900);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(&format!(
        r#"<xdr:wsDr xmlns:xdr="{NS_DRAWING_SPREADSHEET}" xmlns:a="{NS_DRAWING}" xmlns:r="{NS_OFFICE_RELATIONSHIPS}">"#
    ));
    for (idx, picture) in pictures.iter().enumerate() {
        out.push_str(&build_anchor_xml(picture, next_object_id(1, idx), false));
    }
    out.push_str("</xdr:wsDr>");
    out
}

/// Append `pictures` to an existing drawing part.
///
/// The existing content is streamed through unchanged; new anchors go right
/// before the closing root tag and declare their own namespaces, so the
/// prefixes used by the existing part do not matter. Object ids continue
/// after the largest `cNvPr id` already present.
pub(crate) fn append_to_drawing_xml(
    original: &[u8],
    pictures: &[PictureAnchor<'_>],
) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(original);
    reader.trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(original.len() + pictures.len() * 1000));

    let mut buf = Vec::new();
    let mut depth = 0u32;
    let mut max_id = 0u32;
    let mut closed = false;

    loop {
        let event = reader.read_event_into(&mut buf)?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                if !matches!(event, Event::Empty(_)) {
                    depth += 1;
                }
                if e.local_name().as_ref() == b"cNvPr" {
                    max_id = max_id.max(attr_u32(e, b"id").unwrap_or(0));
                }
                writer.write_event(&event)?;
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 && !closed {
                    for (idx, picture) in pictures.iter().enumerate() {
                        let anchor = build_anchor_xml(picture, next_object_id(max_id, idx), true);
                        writer.get_mut().extend_from_slice(anchor.as_bytes());
                    }
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
        return Err(XlembedError::Parse(
            "drawing part has no closing root element".to_string(),
        ));
    }
    Ok(writer.into_inner())
}

fn next_object_id(after: u32, idx: usize) -> u32 {
    let offset = u32::try_from(idx).unwrap_or(u32::MAX);
    after.saturating_add(1).saturating_add(offset)
}

fn build_anchor_xml(picture: &PictureAnchor<'_>, object_id: u32, declare_ns: bool) -> String {
    let image = picture.instruction;
    let cx = u64::from(image.thumb_width) * EMU_PER_PIXEL;
    let cy = u64::from(image.thumb_height) * EMU_PER_PIXEL;

    let mut out = String::with_capacity(900);
    out.push_str("<xdr:oneCellAnchor");
    if declare_ns {
        out.push_str(&format!(
            r#" xmlns:xdr="{NS_DRAWING_SPREADSHEET}" xmlns:a="{NS_DRAWING}" xmlns:r="{NS_OFFICE_RELATIONSHIPS}""#
        ));
    }
    out.push('>');
    // Drawing coordinates are 0-based.
    out.push_str(&format!(
        "<xdr:from><xdr:col>{}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>",
        image.anchor_col.saturating_sub(1),
        image.anchor_row.saturating_sub(1)
    ));
    out.push_str(&format!(r#"<xdr:ext cx="{cx}" cy="{cy}"/>"#));
    out.push_str(&build_pic_xml(
        object_id,
        picture.embed_rel_id,
        &image.source_url,
        cx,
        cy,
    ));
    out.push_str("<xdr:clientData/></xdr:oneCellAnchor>");
    out
}

fn build_pic_xml(object_id: u32, embed_rel_id: &str, descr: &str, cx: u64, cy: u64) -> String {
    let descr = xml_escape(descr);
    let embed_rel_id = xml_escape(embed_rel_id);
    format!(
        r#"<xdr:pic><xdr:nvPicPr><xdr:cNvPr id="{object_id}" name="Picture {object_id}" descr="{descr}"/><xdr:cNvPicPr><a:picLocks noChangeAspect="1"/></xdr:cNvPicPr></xdr:nvPicPr><xdr:blipFill><a:blip r:embed="{embed_rel_id}"/><a:stretch><a:fillRect/></a:stretch></xdr:blipFill><xdr:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></xdr:spPr></xdr:pic>"#
    )
}
