//! Pipeline driver.
//!
//! A run has two phases. [`plan_embeds`] only reads the worksheet: it scans
//! cells, fetches every URL in order and resolves each attempt, collecting
//! placements and sizing requests. [`apply`] then writes the images and the
//! final sizes into the worksheet. [`run`] does both.
//!
//! Per-URL failures are recorded in the [`EmbedReport`] and never abort the
//! run. Only configuration problems (including a missing header) are fatal,
//! and those surface before anything is fetched or written.

use serde::Serialize;

use crate::cell_ref::cell_ref;
use crate::config::EmbedConfig;
use crate::error::Result;
use crate::fetch::ImageFetcher;
use crate::layout::{LayoutAccumulator, SizingMap};
use crate::plan::{plan, resolve, PlacementFailure, PlacementInstruction};
use crate::scan::{scan, ScanPolicy};
use crate::view::WorksheetView;

/// One attempt that produced no image.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptFailure {
    pub row: u32,
    pub col: u32,
    /// Position of the URL within its cell.
    pub idx: usize,
    pub url: String,
    pub reason: PlacementFailure,
}

/// What a run did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedReport {
    pub policy: ScanPolicy,
    /// Cells that held at least one URL.
    pub cells_scanned: usize,
    pub attempts: usize,
    pub embedded: usize,
    pub failures: Vec<AttemptFailure>,
    /// Sizes written (only those that grew).
    pub sizing: SizingMap,
}

impl EmbedReport {
    fn new(policy: ScanPolicy) -> Self {
        Self {
            policy,
            cells_scanned: 0,
            attempts: 0,
            embedded: 0,
            failures: Vec::new(),
            sizing: SizingMap::default(),
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Result of the read-only phase.
#[derive(Debug, Clone)]
pub struct EmbedPlan {
    pub instructions: Vec<PlacementInstruction>,
    pub sizing: SizingMap,
    pub report: EmbedReport,
}

impl EmbedPlan {
    /// Whether applying the plan would leave the sheet untouched.
    pub fn is_noop(&self) -> bool {
        self.instructions.is_empty() && self.sizing.is_empty()
    }
}

/// Scan, fetch and resolve without touching the worksheet.
pub fn plan_embeds<V, F>(view: &V, config: &EmbedConfig, fetcher: &F) -> Result<EmbedPlan>
where
    V: WorksheetView + ?Sized,
    F: ImageFetcher + ?Sized,
{
    config.validate()?;
    let header_label = config.required_header_label()?;
    let policy = config.scan_policy;
    let timeout = config.fetch_timeout();

    let cells = scan(view, policy, header_label)?;

    let mut report = EmbedReport::new(policy);
    let mut instructions = Vec::new();
    let mut layout = LayoutAccumulator::new();

    for cell in cells {
        report.cells_scanned += 1;

        for attempt in plan(&cell, policy) {
            report.attempts += 1;

            let outcome = if attempt.anchor_col.is_some() {
                resolve(&attempt, fetcher.fetch(&attempt.url, timeout), config)
            } else {
                Err(PlacementFailure::AnchorOutOfRange)
            };

            match outcome {
                Ok(placement) => {
                    layout.extend(placement.adjustments);
                    instructions.push(placement.instruction);
                }
                Err(reason) => {
                    log::debug!(
                        "{} url #{} {}: {reason}",
                        cell_ref(attempt.source_row, attempt.source_col),
                        attempt.idx,
                        attempt.url
                    );
                    report.failures.push(AttemptFailure {
                        row: attempt.source_row,
                        col: attempt.source_col,
                        idx: attempt.idx,
                        url: attempt.url,
                        reason,
                    });
                }
            }
        }
    }

    report.embedded = instructions.len();
    let sizing = layout.finalize(view);
    report.sizing = sizing.clone();

    log::info!(
        "{policy}: {} cell(s), {} url(s), {} embedded, {} failed",
        report.cells_scanned,
        report.attempts,
        report.embedded,
        report.failed()
    );

    Ok(EmbedPlan {
        instructions,
        sizing,
        report,
    })
}

/// Write a plan's images and sizes into the worksheet.
pub fn apply<V: WorksheetView + ?Sized>(view: &mut V, plan: EmbedPlan) -> EmbedReport {
    for instruction in plan.instructions {
        view.add_image(instruction);
    }
    plan.sizing.apply_to(view);
    plan.report
}

/// [`plan_embeds`] followed by [`apply`].
pub fn run<V, F>(view: &mut V, config: &EmbedConfig, fetcher: &F) -> Result<EmbedReport>
where
    V: WorksheetView + ?Sized,
    F: ImageFetcher + ?Sized,
{
    let plan = plan_embeds(&*view, config, fetcher)?;
    Ok(apply(view, plan))
}
