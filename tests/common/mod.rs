//! Common test utilities and assertion helpers.
//!
//! Readers for the entries of an output package and a scripted
//! [`ImageFetcher`] so the pipeline can run without a network.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::time::Duration;

use xlembed::{FetchFailure, FetchResult, ImageFetcher};

// Re-export fixtures for convenience
pub use super::fixtures::*;

// ============================================================================
// Package Readers
// ============================================================================

/// Names of all entries, in archive order.
#[must_use]
pub fn entry_names(data: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).expect("Failed to open ZIP archive");
    (0..archive.len())
        .map(|i| archive.by_index_raw(i).unwrap().name().to_string())
        .collect()
}

/// Decompressed bytes of an entry, if present.
#[must_use]
pub fn entry_bytes(data: &[u8], name: &str) -> Option<Vec<u8>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).expect("Failed to open ZIP archive");
    let mut file = archive.by_name(name).ok()?;
    let mut out = Vec::new();
    file.read_to_end(&mut out).expect("Failed to read entry");
    Some(out)
}

/// An entry as UTF-8 text. Panics when missing.
#[must_use]
pub fn entry_text(data: &[u8], name: &str) -> String {
    let bytes = entry_bytes(data, name).unwrap_or_else(|| panic!("missing entry {name}"));
    String::from_utf8(bytes).expect("entry is not UTF-8")
}

/// CRC-32 of each entry as stored in the archive.
#[must_use]
pub fn entry_crcs(data: &[u8]) -> HashMap<String, u32> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).expect("Failed to open ZIP archive");
    (0..archive.len())
        .map(|i| {
            let file = archive.by_index_raw(i).unwrap();
            (file.name().to_string(), file.crc32())
        })
        .collect()
}

/// Entries under `xl/media/`.
#[must_use]
pub fn media_entries(data: &[u8]) -> Vec<String> {
    entry_names(data)
        .into_iter()
        .filter(|name| name.starts_with("xl/media/"))
        .collect()
}

/// Values of every `<xdr:col>` / `<xdr:row>` pair of `oneCellAnchor`s, 0-based,
/// in document order.
#[must_use]
pub fn one_cell_anchors(drawing_xml: &str) -> Vec<(u32, u32)> {
    drawing_xml
        .split("<xdr:oneCellAnchor")
        .skip(1)
        .map(|anchor| {
            let col = between(anchor, "<xdr:col>", "</xdr:col>").parse().unwrap();
            let row = between(anchor, "<xdr:row>", "</xdr:row>").parse().unwrap();
            (col, row)
        })
        .collect()
}

fn between<'a>(s: &'a str, start: &str, end: &str) -> &'a str {
    let from = s.find(start).unwrap() + start.len();
    let to = from + s[from..].find(end).unwrap();
    &s[from..to]
}

// ============================================================================
// Scripted Fetcher
// ============================================================================

/// Serves fixed responses per URL and records every call in order.
///
/// Unknown URLs answer 404 unless a default body is set.
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: HashMap<String, FetchResult>,
    default_body: Option<Vec<u8>>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every URL not scripted otherwise returns a PNG.
    #[must_use]
    pub fn serving_png() -> Self {
        Self {
            default_body: Some(PNG_BYTES.to_vec()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn ok(mut self, url: &str, bytes: &[u8]) -> Self {
        self.responses.insert(
            url.to_string(),
            FetchResult::Fetched {
                bytes: bytes.to_vec(),
            },
        );
        self
    }

    #[must_use]
    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.responses
            .insert(url.to_string(), FetchResult::failed(FetchFailure::Status(status)));
        self
    }

    #[must_use]
    pub fn timeout(mut self, url: &str) -> Self {
        self.responses.insert(
            url.to_string(),
            FetchResult::failed(FetchFailure::Transport("timed out".to_string())),
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl ImageFetcher for ScriptedFetcher {
    fn fetch(&self, url: &str, _timeout: Duration) -> FetchResult {
        self.calls.borrow_mut().push(url.to_string());
        if let Some(result) = self.responses.get(url) {
            return result.clone();
        }
        match &self.default_body {
            Some(bytes) => FetchResult::Fetched {
                bytes: bytes.clone(),
            },
            None => FetchResult::failed(FetchFailure::Status(404)),
        }
    }
}
