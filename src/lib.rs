//! xlembed - embed images referenced by URLs in XLSX cells
//!
//! Scans the active worksheet of an XLSX file for cells containing image
//! URLs, downloads each image and embeds it as an anchored thumbnail:
//! - Three scan policies: one named column with one image per cell, one
//!   named column fanning several images out to the right, or every cell
//! - Per-URL failures are isolated and reported, never fatal
//! - Column widths and row heights only ever grow
//! - Everything outside the worksheet, its drawing and new media is copied
//!   byte-identical
//!
//! # Usage
//!
//! ```no_run
//! use xlembed::{embed_images, EmbedConfig, HttpFetcher, ScanPolicy};
//!
//! # fn main() -> xlembed::Result<()> {
//! let data = std::fs::read("products.xlsx")?;
//! let config = EmbedConfig::named_column(ScanPolicy::NamedColumnMulti, "Photos");
//! let embedded = embed_images(&data, &config, &HttpFetcher::new())?;
//! std::fs::write("products_with_images.xlsx", &embedded.bytes)?;
//! println!("{} image(s) embedded", embedded.report.embedded);
//! # Ok(())
//! # }
//! ```

// Embedding engine
pub mod config;
pub mod engine;
pub mod extract;
pub mod fetch;
pub mod layout;
pub mod plan;
pub mod scan;
pub mod view;

// XLSX package handling
pub mod cell_ref;
pub mod error;
pub mod export;
pub mod namespaces;
pub mod parser;
pub mod types;
pub mod xml_helpers;

pub use config::{EmbedConfig, ThumbnailSize};
pub use engine::{apply, plan_embeds, run, AttemptFailure, EmbedPlan, EmbedReport};
pub use error::{Result, XlembedError};
pub use extract::extract;
pub use fetch::{FetchFailure, FetchResult, HttpFetcher, ImageFetcher};
pub use layout::{accumulate, LayoutAccumulator, SizingMap};
pub use plan::{PlacementAttempt, PlacementFailure, PlacementInstruction, SizeAdjustment};
pub use scan::{ScanPolicy, ScannedCell};
pub use types::*;
pub use view::WorksheetView;

/// Output of [`embed_images`].
#[derive(Debug, Clone)]
pub struct Embedded {
    /// The new XLSX file.
    pub bytes: Vec<u8>,
    pub report: EmbedReport,
}

/// Embed the images referenced by the active worksheet of an XLSX file.
///
/// # Arguments
/// * `data` - The raw bytes of the XLSX file
/// * `config` - Scan policy, header label, timeout and sizes
/// * `fetcher` - Source of image bytes, usually an [`HttpFetcher`]
///
/// # Errors
/// Returns an error if the configuration is invalid, the configured header
/// is missing, or the file cannot be read or written. Failures of individual
/// URLs are not errors; they are listed in the report.
pub fn embed_images<F>(data: &[u8], config: &EmbedConfig, fetcher: &F) -> Result<Embedded>
where
    F: ImageFetcher + ?Sized,
{
    config.validate()?;
    let mut sheet = parser::load_active_sheet(data)?;
    let report = run(&mut sheet, config, fetcher)?;
    let bytes = export::save_xlsx(data, &sheet)?;
    Ok(Embedded { bytes, report })
}

/// Get the library version
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
