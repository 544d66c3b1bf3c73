//! Placement planning.
//!
//! Every URL of a scanned cell becomes one [`PlacementAttempt`]. The anchor
//! column comes from the URL's ordinal position alone: under fan-out policies
//! the k-th URL lands `k` columns right of its source cell whether or not the
//! URLs before it could be downloaded. A failed attempt leaves its column
//! empty; later images are not shifted left to fill it.

use serde::Serialize;

use crate::cell_ref::MAX_COL;
use crate::config::{EmbedConfig, ThumbnailSize};
use crate::fetch::{FetchFailure, FetchResult};
use crate::scan::{ScanPolicy, ScannedCell};
use crate::types::ImageFormat;

/// One URL of a cell together with the cell it would be anchored at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementAttempt {
    /// 0-based position of the URL within its cell.
    pub idx: usize,
    pub url: String,
    pub source_row: u32,
    pub source_col: u32,
    /// `None` when the fan-out runs past the last worksheet column.
    pub anchor_col: Option<u32>,
}

impl PlacementAttempt {
    /// Anchor row is always the source row.
    pub fn anchor_row(&self) -> u32 {
        self.source_row
    }
}

/// An image ready to be anchored into the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementInstruction {
    pub anchor_row: u32,
    pub anchor_col: u32,
    pub image_bytes: Vec<u8>,
    pub format: ImageFormat,
    /// Pixels.
    pub thumb_width: u32,
    /// Pixels.
    pub thumb_height: u32,
    /// Kept as the picture's alt text.
    pub source_url: String,
}

/// A "raise to at least" request. Never shrinks anything.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "target", rename_all = "camelCase")]
pub enum SizeAdjustment {
    ColumnWidth { col: u32, at_least: f64 },
    RowHeight { row: u32, at_least: f64 },
}

/// A successfully resolved attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub instruction: PlacementInstruction,
    pub adjustments: [SizeAdjustment; 2],
}

/// Why an attempt produced no image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PlacementFailure {
    #[error("download failed: {reason}")]
    Fetch { reason: FetchFailure },
    #[error("payload is not a recognized image format")]
    UnrecognizedImage,
    #[error("anchor column would exceed the last worksheet column")]
    AnchorOutOfRange,
}

/// Expand a scanned cell into one attempt per URL, in URL order.
pub fn plan(cell: &ScannedCell, policy: ScanPolicy) -> Vec<PlacementAttempt> {
    let urls: &[String] = if policy.fans_out() {
        &cell.urls
    } else {
        cell.urls.get(..1).unwrap_or_default()
    };

    urls.iter()
        .enumerate()
        .map(|(idx, url)| PlacementAttempt {
            idx,
            url: url.clone(),
            source_row: cell.row,
            source_col: cell.col,
            anchor_col: anchor_col(cell.col, idx, policy),
        })
        .collect()
}

/// Target column for the `idx`-th URL of a cell in `source_col`.
pub fn anchor_col(source_col: u32, idx: usize, policy: ScanPolicy) -> Option<u32> {
    if !policy.fans_out() {
        return Some(source_col);
    }
    let offset = u32::try_from(idx).ok()?;
    source_col
        .checked_add(offset)
        .filter(|&col| col <= MAX_COL)
}

/// Turn an attempt plus its download outcome into a placement.
pub fn resolve(
    attempt: &PlacementAttempt,
    fetched: FetchResult,
    config: &EmbedConfig,
) -> Result<Placement, PlacementFailure> {
    let anchor_col = attempt
        .anchor_col
        .ok_or(PlacementFailure::AnchorOutOfRange)?;

    let bytes = match fetched {
        FetchResult::Fetched { bytes } => bytes,
        FetchResult::Failed { reason } => return Err(PlacementFailure::Fetch { reason }),
    };

    let format = ImageFormat::from_magic_bytes(&bytes);
    if format == ImageFormat::Unknown {
        return Err(PlacementFailure::UnrecognizedImage);
    }

    let ThumbnailSize { width, height } = config.thumbnail_size;
    let anchor_row = attempt.anchor_row();

    Ok(Placement {
        instruction: PlacementInstruction {
            anchor_row,
            anchor_col,
            image_bytes: bytes,
            format,
            thumb_width: width,
            thumb_height: height,
            source_url: attempt.url.clone(),
        },
        adjustments: [
            SizeAdjustment::ColumnWidth {
                col: anchor_col,
                at_least: config.min_column_width,
            },
            SizeAdjustment::RowHeight {
                row: anchor_row,
                at_least: config.min_row_height,
            },
        ],
    })
}
