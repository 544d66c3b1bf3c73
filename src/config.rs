//! Run configuration.
//!
//! Options can be built in code or decoded from a camelCase JSON document:
//!
//! ```json
//! {
//!   "scanPolicy": "single-column-multi-image",
//!   "headerLabel": "Shelf photos",
//!   "fetchTimeoutSecs": 10,
//!   "thumbnailSize": { "width": 100, "height": 100 },
//!   "minColumnWidth": 18,
//!   "minRowHeight": 80
//! }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, XlembedError};
use crate::scan::ScanPolicy;

/// Thumbnail footprint in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ThumbnailSize {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
        }
    }
}

/// Options recognized by the embedding engine.
///
/// The default is a whole-sheet scan, which needs no header label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct EmbedConfig {
    pub scan_policy: ScanPolicy,
    /// Header text locating the image column. Required by the single-column policies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_label: Option<String>,
    pub fetch_timeout_secs: f64,
    pub thumbnail_size: ThumbnailSize,
    /// Column-width units.
    pub min_column_width: f64,
    /// Points.
    pub min_row_height: f64,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            scan_policy: ScanPolicy::WholeSheet,
            header_label: None,
            fetch_timeout_secs: 10.0,
            thumbnail_size: ThumbnailSize::default(),
            min_column_width: 18.0,
            min_row_height: 80.0,
        }
    }
}

impl EmbedConfig {
    /// Config for a whole-sheet scan with default sizes.
    #[must_use]
    pub fn whole_sheet() -> Self {
        Self {
            scan_policy: ScanPolicy::WholeSheet,
            ..Self::default()
        }
    }

    /// Config for a named-column scan with default sizes.
    #[must_use]
    pub fn named_column(policy: ScanPolicy, header_label: impl Into<String>) -> Self {
        Self {
            scan_policy: policy,
            header_label: Some(header_label.into()),
            ..Self::default()
        }
    }

    /// Decode a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.fetch_timeout_secs).unwrap_or(Duration::from_secs(10))
    }

    /// The header label, or a config error when the policy needs one and none
    /// is set, or when a label is given to a policy that has no header.
    pub fn required_header_label(&self) -> Result<Option<&str>> {
        if !self.scan_policy.requires_header() {
            return match &self.header_label {
                Some(label) => Err(XlembedError::Config(format!(
                    "header label '{label}' is only used by the single-column policies, \
                     not '{}'",
                    self.scan_policy
                ))),
                None => Ok(None),
            };
        }
        match self.header_label.as_deref() {
            Some(label) if !label.trim().is_empty() => Ok(Some(label)),
            _ => Err(XlembedError::Config(format!(
                "scan policy '{}' requires a header label",
                self.scan_policy
            ))),
        }
    }

    /// Check every option before any work starts.
    pub fn validate(&self) -> Result<()> {
        self.required_header_label()?;

        if !self.fetch_timeout_secs.is_finite() || self.fetch_timeout_secs <= 0.0 {
            return Err(XlembedError::Config(format!(
                "fetch timeout must be a positive number of seconds, got {}",
                self.fetch_timeout_secs
            )));
        }
        if self.thumbnail_size.width == 0 || self.thumbnail_size.height == 0 {
            return Err(XlembedError::Config(
                "thumbnail width and height must be non-zero".to_string(),
            ));
        }
        for (name, value) in [
            ("minColumnWidth", self.min_column_width),
            ("minRowHeight", self.min_row_height),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(XlembedError::Config(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }
}
