//! The worksheet surface the engine reads from and writes to.

use crate::plan::PlacementInstruction;

/// A rectangular grid of cells addressed by 1-based `(row, col)`.
///
/// Widths are in the spreadsheet's column-width units and heights in points.
/// `None` means the column/row has no explicit size and uses the sheet default.
pub trait WorksheetView {
    /// Text of the cell, or `None` when the cell is blank or absent.
    fn cell_text(&self, row: u32, col: u32) -> Option<&str>;

    /// Last row holding a cell, `0` for an empty sheet.
    fn last_row(&self) -> u32;

    /// Last column holding a cell, `0` for an empty sheet.
    fn last_col(&self) -> u32;

    fn column_width(&self, col: u32) -> Option<f64>;

    fn set_column_width(&mut self, col: u32, width: f64);

    fn row_height(&self, row: u32) -> Option<f64>;

    fn set_row_height(&mut self, row: u32, height: f64);

    /// Anchor an image with its top-left corner at the instruction's cell.
    fn add_image(&mut self, image: PlacementInstruction);
}
