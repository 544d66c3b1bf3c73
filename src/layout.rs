//! Sheet-wide sizing decisions.
//!
//! Images from different cells can compete for the same row or column. Each
//! placement contributes "at least" requests; the accumulator keeps the largest
//! request per row/column, which is a commutative, associative max-reduce, so
//! the outcome does not depend on the order cells were processed in.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::plan::SizeAdjustment;
use crate::view::WorksheetView;

/// Largest requested width per column and height per row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutAccumulator {
    columns: BTreeMap<u32, f64>,
    rows: BTreeMap<u32, f64>,
}

impl LayoutAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, adjustment: SizeAdjustment) {
        match adjustment {
            SizeAdjustment::ColumnWidth { col, at_least } => {
                raise(&mut self.columns, col, at_least);
            }
            SizeAdjustment::RowHeight { row, at_least } => {
                raise(&mut self.rows, row, at_least);
            }
        }
    }

    /// Fold another accumulator into this one.
    pub fn merge(&mut self, other: LayoutAccumulator) {
        for (col, width) in other.columns {
            raise(&mut self.columns, col, width);
        }
        for (row, height) in other.rows {
            raise(&mut self.rows, row, height);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    pub fn requested_width(&self, col: u32) -> Option<f64> {
        self.columns.get(&col).copied()
    }

    pub fn requested_height(&self, row: u32) -> Option<f64> {
        self.rows.get(&row).copied()
    }

    /// Combine requests with the sheet's current sizes.
    ///
    /// Only rows/columns whose size actually grows appear in the result.
    pub fn finalize<V: WorksheetView + ?Sized>(&self, view: &V) -> SizingMap {
        let column_widths = self
            .columns
            .iter()
            .filter(|&(&col, &width)| grows(view.column_width(col), width))
            .map(|(&col, &width)| (col, width))
            .collect();
        let row_heights = self
            .rows
            .iter()
            .filter(|&(&row, &height)| grows(view.row_height(row), height))
            .map(|(&row, &height)| (row, height))
            .collect();
        SizingMap {
            column_widths,
            row_heights,
        }
    }
}

impl Extend<SizeAdjustment> for LayoutAccumulator {
    fn extend<I: IntoIterator<Item = SizeAdjustment>>(&mut self, iter: I) {
        for adjustment in iter {
            self.request(adjustment);
        }
    }
}

impl FromIterator<SizeAdjustment> for LayoutAccumulator {
    fn from_iter<I: IntoIterator<Item = SizeAdjustment>>(iter: I) -> Self {
        let mut acc = Self::new();
        acc.extend(iter);
        acc
    }
}

/// Collect adjustments into an accumulator.
pub fn accumulate<I: IntoIterator<Item = SizeAdjustment>>(adjustments: I) -> LayoutAccumulator {
    adjustments.into_iter().collect()
}

/// Final sizes to write: `max(current, largest request)` for every touched
/// row/column that grows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SizingMap {
    pub column_widths: BTreeMap<u32, f64>,
    pub row_heights: BTreeMap<u32, f64>,
}

impl SizingMap {
    pub fn is_empty(&self) -> bool {
        self.column_widths.is_empty() && self.row_heights.is_empty()
    }

    pub fn apply_to<V: WorksheetView + ?Sized>(&self, view: &mut V) {
        for (&col, &width) in &self.column_widths {
            view.set_column_width(col, width);
        }
        for (&row, &height) in &self.row_heights {
            view.set_row_height(row, height);
        }
    }
}

fn raise(map: &mut BTreeMap<u32, f64>, key: u32, value: f64) {
    let slot = map.entry(key).or_insert(value);
    if value > *slot {
        *slot = value;
    }
}

fn grows(current: Option<f64>, requested: f64) -> bool {
    current.is_none_or(|current| requested > current)
}
