//! Worksheet parsing - reads cell text, column spans, row heights and the
//! drawing reference of one worksheet part.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;

use crate::cell_ref::parse_cell_ref_bytes;
use crate::error::Result;
use crate::types::{ColumnSpan, Sheet};
use crate::xml_helpers::{attr_f64, attr_rel_id, attr_u32, owned_attrs};

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Default,
}

pub(super) fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        b"str" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        _ => CellTypeTag::Default,
    }
}

/// Which text node of a cell is being read.
#[derive(Copy, Clone, PartialEq, Eq)]
enum TextTarget {
    None,
    Value,
    Formula,
    Inline,
}

/// State of the `<c>` element being read.
struct PendingCell {
    row: u32,
    col: u32,
    tag: CellTypeTag,
    value: Option<String>,
    formula: Option<String>,
    inline: Option<String>,
}

impl PendingCell {
    fn text(self, shared_strings: &[String]) -> Option<String> {
        match self.tag {
            CellTypeTag::Shared => {
                let idx: usize = self.value?.trim().parse().ok()?;
                shared_strings.get(idx).cloned()
            }
            CellTypeTag::Inline => self.inline.or(self.value),
            CellTypeTag::Bool => self.value.map(|v| {
                if v.trim() == "1" {
                    "TRUE".to_string()
                } else {
                    "FALSE".to_string()
                }
            }),
            CellTypeTag::Str | CellTypeTag::Error | CellTypeTag::Default => self
                .value
                .or_else(|| self.formula.map(|f| format!("={f}"))),
        }
    }
}

/// Parsed result of a worksheet part, before it is attached to a [`Sheet`].
#[derive(Debug, Default)]
pub(super) struct WorksheetContent {
    pub drawing_rel_id: Option<String>,
}

/// Read a worksheet part into `sheet`.
pub(super) fn parse_sheet<B: BufRead>(
    reader: B,
    sheet: &mut Sheet,
    shared_strings: &[String],
) -> Result<WorksheetContent> {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(false);

    let mut content = WorksheetContent::default();
    let mut columns: Vec<ColumnSpan> = Vec::new();

    let mut buf = Vec::new();
    let mut depth = 0u32;
    let mut in_cols = false;
    let mut in_phonetic = false;
    let mut current_row = 0u32;
    let mut last_col_in_row = 0u32;
    let mut cell: Option<PendingCell> = None;
    let mut target = TextTarget::None;

    loop {
        let event = xml.read_event_into(&mut buf)?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                match e.local_name().as_ref() {
                    b"cols" if depth == 1 => in_cols = true,
                    b"col" if in_cols => {
                        if let Some(span) = parse_col(e) {
                            columns.push(span);
                        }
                    }
                    b"row" => {
                        current_row = attr_u32(e, b"r").unwrap_or_else(|| {
                            log::warn!("{}: <row> without r after row {current_row}", sheet.path);
                            current_row + 1
                        });
                        last_col_in_row = 0;
                        if let Some(ht) = attr_f64(e, b"ht") {
                            sheet.load_row_height(current_row, ht);
                        }
                    }
                    b"c" => {
                        let (row, col) = cell_position(e, current_row, last_col_in_row);
                        last_col_in_row = col;
                        sheet.extend_bounds(row, col);
                        if !is_empty {
                            let tag = e
                                .attributes()
                                .flatten()
                                .find(|a| a.key.as_ref() == b"t")
                                .map_or(CellTypeTag::Default, |a| parse_cell_type_tag(&a.value));
                            cell = Some(PendingCell {
                                row,
                                col,
                                tag,
                                value: None,
                                formula: None,
                                inline: None,
                            });
                        }
                    }
                    b"v" if cell.is_some() && !is_empty => target = TextTarget::Value,
                    b"f" if cell.is_some() && !is_empty => target = TextTarget::Formula,
                    b"rPh" if !is_empty => in_phonetic = true,
                    b"t" if cell.is_some() && !is_empty && !in_phonetic => {
                        target = TextTarget::Inline;
                    }
                    b"drawing" if depth == 1 => {
                        content.drawing_rel_id = attr_rel_id(e);
                    }
                    _ => {}
                }
                if !is_empty {
                    depth += 1;
                }
            }
            Event::Text(ref e) if target != TextTarget::None => {
                let text = e.unescape()?;
                if let Some(pending) = cell.as_mut() {
                    let slot = match target {
                        TextTarget::Value => &mut pending.value,
                        TextTarget::Formula => &mut pending.formula,
                        TextTarget::Inline | TextTarget::None => &mut pending.inline,
                    };
                    slot.get_or_insert_with(String::new).push_str(&text);
                }
            }
            Event::End(ref e) => {
                depth = depth.saturating_sub(1);
                match e.local_name().as_ref() {
                    b"cols" => in_cols = false,
                    b"v" | b"f" | b"t" => target = TextTarget::None,
                    b"rPh" => in_phonetic = false,
                    b"c" => {
                        if let Some(pending) = cell.take() {
                            let (row, col) = (pending.row, pending.col);
                            if let Some(text) = pending.text(shared_strings) {
                                sheet.set_cell_text(row, col, text);
                            }
                        }
                        target = TextTarget::None;
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    sheet.load_columns(columns);
    Ok(content)
}

/// Resolve a cell position from `r`, or follow the previous cell when `r` is absent.
fn cell_position(e: &BytesStart, current_row: u32, last_col_in_row: u32) -> (u32, u32) {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == b"r")
        .and_then(|a| parse_cell_ref_bytes(&a.value))
        .unwrap_or((current_row.max(1), last_col_in_row + 1))
}

fn parse_col(e: &BytesStart) -> Option<ColumnSpan> {
    let min = attr_u32(e, b"min")?;
    let max = attr_u32(e, b"max").unwrap_or(min);
    if min == 0 || max < min {
        return None;
    }
    let attrs = owned_attrs(e)
        .into_iter()
        .filter(|(k, _)| !matches!(k.as_str(), "min" | "max" | "width"))
        .collect();
    Some(ColumnSpan {
        min,
        max,
        width: attr_f64(e, b"width"),
        attrs,
    })
}
