//! Data types for the embedding pipeline.

mod image;
mod sheet;

pub use image::*;
pub use sheet::*;
