//! Streaming worksheet patcher.
//!
//! The original worksheet XML is copied event by event. Only three things
//! change: the `<cols>` block (when a column was widened), the `ht` of rows
//! whose height was raised (rows missing from `<sheetData>` are inserted in
//! order), and the `<drawing r:id>` reference when a new drawing part is
//! created. Everything else is written back as read.

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::Result;
use crate::namespaces::NS_OFFICE_RELATIONSHIPS;
use crate::types::{ColumnSpan, Sheet};
use crate::xml_helpers::{attr_u32, declares_prefix, element_prefix, format_number};

/// Child elements of `<worksheet>` in schema order.
const CHILD_ORDER: &[&[u8]] = &[
    b"sheetPr",
    b"dimension",
    b"sheetViews",
    b"sheetFormatPr",
    b"cols",
    b"sheetData",
    b"sheetCalcPr",
    b"sheetProtection",
    b"protectedRanges",
    b"scenarios",
    b"autoFilter",
    b"sortState",
    b"dataConsolidate",
    b"customSheetViews",
    b"mergeCells",
    b"phoneticPr",
    b"conditionalFormatting",
    b"dataValidations",
    b"hyperlinks",
    b"printOptions",
    b"pageMargins",
    b"pageSetup",
    b"headerFooter",
    b"rowBreaks",
    b"colBreaks",
    b"customProperties",
    b"cellWatches",
    b"ignoredErrors",
    b"smartTags",
    b"drawing",
    b"legacyDrawing",
    b"legacyDrawingHF",
    b"drawingHF",
    b"picture",
    b"oleObjects",
    b"controls",
    b"webPublishItems",
    b"tableParts",
    b"extLst",
];

fn order_of(local: &[u8]) -> Option<usize> {
    CHILD_ORDER.iter().position(|name| *name == local)
}

/// Rewrite `original` worksheet XML with the sheet's pending changes.
///
/// `drawing_rel_id` is the relationship id of a newly created drawing part;
/// `None` leaves any `<drawing>` reference untouched.
pub(crate) fn patch_worksheet(
    original: &[u8],
    sheet: &Sheet,
    drawing_rel_id: Option<&str>,
) -> Result<Vec<u8>> {
    let mut patcher = Patcher {
        writer: Writer::new(Vec::with_capacity(original.len() + 1024)),
        prefix: None,
        columns: sheet.columns_changed().then(|| sheet.columns()),
        cols_done: false,
        drawing_rel_id,
        drawing_done: false,
        rows: sheet.changed_rows().collect(),
        next_row: 0,
        depth: 0,
        skipping: false,
        in_sheet_data: false,
        last_row: 0,
    };
    patcher.run(original)?;
    Ok(patcher.writer.into_inner())
}

struct Patcher<'a> {
    writer: Writer<Vec<u8>>,
    /// Namespace prefix of the root element, reused for inserted elements.
    prefix: Option<String>,
    columns: Option<&'a [ColumnSpan]>,
    cols_done: bool,
    drawing_rel_id: Option<&'a str>,
    drawing_done: bool,
    /// Raised row heights, sorted by row.
    rows: Vec<(u32, f64)>,
    next_row: usize,
    depth: u32,
    skipping: bool,
    in_sheet_data: bool,
    last_row: u32,
}

impl Patcher<'_> {
    fn run(&mut self, original: &[u8]) -> Result<()> {
        let mut reader = Reader::from_reader(original);
        reader.trim_text(false);

        let mut buf = Vec::new();
        loop {
            let event = reader.read_event_into(&mut buf)?;
            if matches!(event, Event::Eof) {
                break;
            }
            self.handle(event)?;
            buf.clear();
        }
        Ok(())
    }

    fn handle(&mut self, event: Event<'_>) -> Result<()> {
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                let at = self.depth;
                if !is_empty {
                    self.depth += 1;
                }
                if self.skipping {
                    // inside a replaced element
                } else if at == 0 {
                    self.prefix = element_prefix(e);
                    let mut root = e.clone().into_owned();
                    if self.drawing_rel_id.is_some() && !declares_prefix(e, "r") {
                        root.push_attribute(("xmlns:r", NS_OFFICE_RELATIONSHIPS));
                    }
                    self.write_start(root, is_empty)?;
                } else if at == 1 {
                    let local = e.local_name();
                    if let Some(order) = order_of(local.as_ref()) {
                        self.flush_before(order)?;
                    }
                    match local.as_ref() {
                        b"cols" if self.columns.is_some() => {
                            self.write_cols()?;
                            self.skipping = !is_empty;
                        }
                        b"drawing" if self.drawing_rel_id.is_some() => {
                            self.write_drawing()?;
                            self.skipping = !is_empty;
                        }
                        b"sheetData" if is_empty && self.has_pending_rows() => {
                            let open = e.clone().into_owned();
                            let close = open.to_end().into_owned();
                            self.writer.write_event(Event::Start(open))?;
                            self.write_rows_before(u32::MAX)?;
                            self.writer.write_event(Event::End(close))?;
                        }
                        b"sheetData" => {
                            self.in_sheet_data = !is_empty;
                            self.writer.write_event(&event)?;
                        }
                        _ => self.writer.write_event(&event)?,
                    }
                } else if at == 2 && self.in_sheet_data && e.local_name().as_ref() == b"row" {
                    let row = attr_u32(e, b"r").unwrap_or(self.last_row + 1);
                    self.last_row = row;
                    self.write_rows_before(row)?;
                    match self.take_row(row) {
                        Some(height) => self.write_start(with_height(e, height), is_empty)?,
                        None => self.writer.write_event(&event)?,
                    }
                } else {
                    self.writer.write_event(&event)?;
                }
            }
            Event::End(ref e) => {
                self.depth = self.depth.saturating_sub(1);
                if self.skipping {
                    self.skipping = self.depth > 1;
                } else if self.depth == 0 {
                    self.flush_before(CHILD_ORDER.len())?;
                    self.writer.write_event(&event)?;
                } else if self.depth == 1 && e.local_name().as_ref() == b"sheetData" {
                    self.in_sheet_data = false;
                    self.write_rows_before(u32::MAX)?;
                    self.writer.write_event(&event)?;
                } else {
                    self.writer.write_event(&event)?;
                }
            }
            _ if self.skipping => {}
            _ => self.writer.write_event(&event)?,
        }
        Ok(())
    }

    fn qualified(&self, local: &str) -> String {
        match self.prefix {
            Some(ref prefix) => format!("{prefix}:{local}"),
            None => local.to_string(),
        }
    }

    fn write_start(&mut self, start: BytesStart<'_>, is_empty: bool) -> Result<()> {
        if is_empty {
            self.writer.write_event(Event::Empty(start))?;
        } else {
            self.writer.write_event(Event::Start(start))?;
        }
        Ok(())
    }

    /// Emit pending blocks whose schema position precedes `order`.
    fn flush_before(&mut self, order: usize) -> Result<()> {
        if self.columns.is_some() && !self.cols_done && order > order_of(b"cols").unwrap_or(0) {
            self.write_cols()?;
        }
        if self.drawing_rel_id.is_some()
            && !self.drawing_done
            && order > order_of(b"drawing").unwrap_or(0)
        {
            self.write_drawing()?;
        }
        Ok(())
    }

    fn write_cols(&mut self) -> Result<()> {
        self.cols_done = true;
        let Some(columns) = self.columns else {
            return Ok(());
        };
        if columns.is_empty() {
            return Ok(());
        }

        let cols = self.qualified("cols");
        let col = self.qualified("col");
        self.writer.write_event(Event::Start(BytesStart::new(cols.as_str())))?;
        for span in columns {
            let mut el = BytesStart::new(col.as_str());
            el.push_attribute(("min", span.min.to_string().as_str()));
            el.push_attribute(("max", span.max.to_string().as_str()));
            if let Some(width) = span.width {
                el.push_attribute(("width", format_number(width).as_str()));
            }
            for (key, value) in &span.attrs {
                el.push_attribute((key.as_str(), value.as_str()));
            }
            self.writer.write_event(Event::Empty(el))?;
        }
        self.writer.write_event(Event::End(BytesEnd::new(cols.as_str())))?;
        Ok(())
    }

    fn write_drawing(&mut self) -> Result<()> {
        self.drawing_done = true;
        let Some(rel_id) = self.drawing_rel_id else {
            return Ok(());
        };
        let name = self.qualified("drawing");
        let mut el = BytesStart::new(name.as_str());
        el.push_attribute(("r:id", rel_id));
        self.writer.write_event(Event::Empty(el))?;
        Ok(())
    }

    fn has_pending_rows(&self) -> bool {
        self.next_row < self.rows.len()
    }

    /// Insert rows absent from `<sheetData>` that sort before `row`.
    fn write_rows_before(&mut self, row: u32) -> Result<()> {
        let name = self.qualified("row");
        while let Some(&(pending, height)) = self.rows.get(self.next_row) {
            if pending >= row {
                break;
            }
            self.next_row += 1;
            let mut el = BytesStart::new(name.as_str());
            el.push_attribute(("r", pending.to_string().as_str()));
            el.push_attribute(("ht", format_number(height).as_str()));
            el.push_attribute(("customHeight", "1"));
            self.writer.write_event(Event::Empty(el))?;
        }
        Ok(())
    }

    fn take_row(&mut self, row: u32) -> Option<f64> {
        match self.rows.get(self.next_row) {
            Some(&(pending, height)) if pending == row => {
                self.next_row += 1;
                Some(height)
            }
            _ => None,
        }
    }
}

/// Copy of a `<row>` start tag with `ht`/`customHeight` replaced.
fn with_height(e: &BytesStart<'_>, height: f64) -> BytesStart<'static> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut out = BytesStart::new(name);
    for attr in e.attributes().flatten() {
        if !matches!(attr.key.as_ref(), b"ht" | b"customHeight") {
            out.push_attribute(attr);
        }
    }
    out.push_attribute(("ht", format_number(height).as_str()));
    out.push_attribute(("customHeight", "1"));
    out.into_owned()
}
