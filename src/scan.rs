//! Cell scanning.
//!
//! A scan walks the data rows (row 2 through the last used row) of a
//! [`WorksheetView`] in row-major order and yields every cell whose text
//! contains at least one URL. Bounds are captured when the scan starts, so
//! anything written to the sheet while the scan is running is not revisited.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cell_ref::cell_ref;
use crate::error::{Result, XlembedError};
use crate::extract::extract;
use crate::view::WorksheetView;

/// First row holding data; row 1 is the header row.
pub const FIRST_DATA_ROW: u32 = 2;

/// Which cells are eligible and how many URLs per cell are used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScanPolicy {
    /// Only the header-named column; only the first URL of each cell.
    #[serde(rename = "single-column-single-image")]
    NamedColumnSingle,
    /// Only the header-named column; every URL, fanned out to the right.
    #[default]
    #[serde(rename = "single-column-multi-image")]
    NamedColumnMulti,
    /// Every cell of every data row; every URL, fanned out to the right.
    #[serde(rename = "whole-sheet")]
    WholeSheet,
}

impl ScanPolicy {
    /// Whether the policy locates its column through a header label.
    #[must_use]
    pub fn requires_header(self) -> bool {
        matches!(self, Self::NamedColumnSingle | Self::NamedColumnMulti)
    }

    /// Whether every URL of a cell is placed, one column apart.
    #[must_use]
    pub fn fans_out(self) -> bool {
        !matches!(self, Self::NamedColumnSingle)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NamedColumnSingle => "single-column-single-image",
            Self::NamedColumnMulti => "single-column-multi-image",
            Self::WholeSheet => "whole-sheet",
        }
    }
}

impl fmt::Display for ScanPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScanPolicy {
    type Err = XlembedError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "single-column-single-image" | "single" => Ok(Self::NamedColumnSingle),
            "single-column-multi-image" | "multi" => Ok(Self::NamedColumnMulti),
            "whole-sheet" | "sheet" => Ok(Self::WholeSheet),
            other => Err(XlembedError::Config(format!("unknown scan policy '{other}'"))),
        }
    }
}

/// A cell with at least one URL, in the order the URLs appear in its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedCell {
    pub row: u32,
    pub col: u32,
    pub urls: Vec<String>,
}

/// Find the 1-based column whose header (row 1) equals `label` after trimming
/// the cell text. The leftmost match wins.
pub fn find_header_column<V: WorksheetView + ?Sized>(view: &V, label: &str) -> Option<u32> {
    (1..=view.last_col()).find(|&col| {
        view.cell_text(1, col)
            .is_some_and(|text| text.trim() == label)
    })
}

/// Start a scan under `policy`.
///
/// Named-column policies resolve their column up front and fail with
/// [`XlembedError::HeaderNotFound`] before yielding anything when the label is
/// absent from the header row.
pub fn scan<'a, V: WorksheetView + ?Sized>(
    view: &'a V,
    policy: ScanPolicy,
    header_label: Option<&str>,
) -> Result<CellScan<'a, V>> {
    let last_row = view.last_row();
    let last_col = view.last_col();

    let (first_col, end_col) = if policy.requires_header() {
        let label = header_label.ok_or_else(|| {
            XlembedError::Config(format!("scan policy '{policy}' requires a header label"))
        })?;
        let col = find_header_column(view, label).ok_or_else(|| XlembedError::HeaderNotFound {
            label: label.to_string(),
        })?;
        (col, col)
    } else {
        (1, last_col)
    };

    Ok(CellScan {
        view,
        policy,
        row: FIRST_DATA_ROW,
        col: first_col,
        first_col,
        end_col,
        last_row,
        done: last_row < FIRST_DATA_ROW || first_col == 0 || first_col > end_col,
    })
}

/// Single-pass iterator over eligible cells; see [`scan`].
pub struct CellScan<'a, V: WorksheetView + ?Sized> {
    view: &'a V,
    policy: ScanPolicy,
    row: u32,
    col: u32,
    first_col: u32,
    end_col: u32,
    last_row: u32,
    done: bool,
}

impl<V: WorksheetView + ?Sized> CellScan<'_, V> {
    /// The rows this scan covers, as captured at start.
    pub fn row_range(&self) -> std::ops::RangeInclusive<u32> {
        FIRST_DATA_ROW..=self.last_row
    }

    /// The columns this scan covers, as captured at start.
    pub fn col_range(&self) -> std::ops::RangeInclusive<u32> {
        self.first_col..=self.end_col
    }

    fn advance(&mut self) {
        if self.col < self.end_col {
            self.col += 1;
        } else if self.row < self.last_row {
            self.col = self.first_col;
            self.row += 1;
        } else {
            self.done = true;
        }
    }
}

impl<V: WorksheetView + ?Sized> Iterator for CellScan<'_, V> {
    type Item = ScannedCell;

    fn next(&mut self) -> Option<ScannedCell> {
        while !self.done {
            let (row, col) = (self.row, self.col);
            self.advance();

            let Some(text) = self.view.cell_text(row, col) else {
                continue;
            };
            if text.trim().is_empty() {
                continue;
            }

            let mut urls = extract(text);
            if urls.is_empty() {
                continue;
            }
            if !self.policy.fans_out() {
                urls.truncate(1);
            }

            log::debug!("{}: {} url(s)", cell_ref(row, col), urls.len());
            return Some(ScannedCell { row, col, urls });
        }
        None
    }
}
