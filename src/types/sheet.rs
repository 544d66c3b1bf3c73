use std::collections::{BTreeMap, BTreeSet};

use crate::plan::PlacementInstruction;
use crate::view::WorksheetView;

/// A `<col>` element: one width and attribute set for `min..=max`.
///
/// Attributes other than `min`, `max` and `width` are kept verbatim so
/// rewritten spans carry the original styling and visibility.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpan {
    pub min: u32,
    pub max: u32,
    pub width: Option<f64>,
    pub attrs: Vec<(String, String)>,
}

impl ColumnSpan {
    #[must_use]
    pub fn new(min: u32, max: u32, width: Option<f64>) -> Self {
        Self {
            min,
            max,
            width,
            attrs: Vec::new(),
        }
    }

    fn contains(&self, col: u32) -> bool {
        (self.min..=self.max).contains(&col)
    }

    fn narrowed(&self, min: u32, max: u32) -> Self {
        Self {
            min,
            max,
            ..self.clone()
        }
    }

    fn set_attr(&mut self, key: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.attrs.push((key.to_string(), value.to_string())),
        }
    }
}

/// The worksheet's existing drawing part, if it has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawingLink {
    /// Relationship id referenced by the worksheet's `<drawing r:id>`.
    pub rel_id: String,
    /// Package path of the drawing part.
    pub path: String,
}

/// In-memory worksheet: cell text, sizing and queued images.
///
/// Only the parts of a worksheet the embedding engine reads or changes are
/// modelled. Everything else stays in the original XML and is carried over
/// when the sheet is written back.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    /// Package path of the worksheet part, e.g. `xl/worksheets/sheet1.xml`.
    pub path: String,
    pub drawing: Option<DrawingLink>,
    cells: BTreeMap<(u32, u32), String>,
    last_row: u32,
    last_col: u32,
    columns: Vec<ColumnSpan>,
    row_heights: BTreeMap<u32, f64>,
    columns_changed: bool,
    changed_rows: BTreeSet<u32>,
    images: Vec<PlacementInstruction>,
}

impl Sheet {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set a cell's text. Empty text still counts toward the sheet bounds.
    pub fn set_cell_text(&mut self, row: u32, col: u32, text: impl Into<String>) {
        self.extend_bounds(row, col);
        let text = text.into();
        if text.is_empty() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), text);
        }
    }

    /// Grow the used range to include `(row, col)`.
    pub fn extend_bounds(&mut self, row: u32, col: u32) {
        self.last_row = self.last_row.max(row);
        self.last_col = self.last_col.max(col);
    }

    /// Column spans as loaded from `<cols>` (plus any changes), sorted by `min`.
    pub fn columns(&self) -> &[ColumnSpan] {
        &self.columns
    }

    /// Replace the column spans without marking them as changed.
    pub fn load_columns(&mut self, mut columns: Vec<ColumnSpan>) {
        columns.sort_by_key(|span| span.min);
        self.columns = columns;
    }

    /// Record a row height read from the source without marking it as changed.
    pub fn load_row_height(&mut self, row: u32, height: f64) {
        self.row_heights.insert(row, height);
    }

    pub fn columns_changed(&self) -> bool {
        self.columns_changed
    }

    /// Rows whose height was raised, with their new height.
    pub fn changed_rows(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.changed_rows
            .iter()
            .filter_map(|row| self.row_heights.get(row).map(|&height| (*row, height)))
    }

    /// Images queued by [`WorksheetView::add_image`], in insertion order.
    pub fn images(&self) -> &[PlacementInstruction] {
        &self.images
    }

    /// Whether anything needs to be written back.
    pub fn is_modified(&self) -> bool {
        self.columns_changed || !self.changed_rows.is_empty() || !self.images.is_empty()
    }

    fn span_index(&self, col: u32) -> Option<usize> {
        self.columns.iter().position(|span| span.contains(col))
    }
}

impl WorksheetView for Sheet {
    fn cell_text(&self, row: u32, col: u32) -> Option<&str> {
        self.cells.get(&(row, col)).map(String::as_str)
    }

    fn last_row(&self) -> u32 {
        self.last_row
    }

    fn last_col(&self) -> u32 {
        self.last_col
    }

    fn column_width(&self, col: u32) -> Option<f64> {
        self.span_index(col)
            .and_then(|idx| self.columns.get(idx))
            .and_then(|span| span.width)
    }

    fn set_column_width(&mut self, col: u32, width: f64) {
        self.columns_changed = true;

        let Some(idx) = self.span_index(col) else {
            let mut span = ColumnSpan::new(col, col, Some(width));
            span.set_attr("customWidth", "1");
            let at = self.columns.partition_point(|s| s.min < col);
            self.columns.insert(at, span);
            return;
        };

        // Split the covering span so only `col` changes.
        let old = self.columns.remove(idx);
        let mut pieces = Vec::with_capacity(3);
        if old.min < col {
            pieces.push(old.narrowed(old.min, col - 1));
        }
        let mut target = old.narrowed(col, col);
        target.width = Some(width);
        target.set_attr("customWidth", "1");
        pieces.push(target);
        if col < old.max {
            pieces.push(old.narrowed(col + 1, old.max));
        }
        for (offset, piece) in pieces.into_iter().enumerate() {
            self.columns.insert(idx + offset, piece);
        }
    }

    fn row_height(&self, row: u32) -> Option<f64> {
        self.row_heights.get(&row).copied()
    }

    fn set_row_height(&mut self, row: u32, height: f64) {
        self.row_heights.insert(row, height);
        self.changed_rows.insert(row);
    }

    fn add_image(&mut self, image: PlacementInstruction) {
        self.images.push(image);
    }
}
