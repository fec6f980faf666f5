//! Execution engine - applies and verifies the items of a bundle in order

use crate::bundle::Bundle;
use crate::context::{ApplyMode, AutoConfirm, ConfirmCallback, NoProgress, ProgressCallback};
use crate::error::{ErrorCategory, Result};
use crate::item::{ApplyOutcome, ItemId, Reconcile};
use serde::Serialize;

/// Outcome of applying one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemReport {
    pub id: ItemId,
    pub outcome: ApplyOutcome,
    /// Error text when `apply` returned an error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemReport {
    pub fn new(id: &ItemId, outcome: ApplyOutcome) -> Self {
        Self {
            id: id.clone(),
            outcome,
            error: None,
        }
    }

    pub fn failed(id: &ItemId, error: String) -> Self {
        Self {
            id: id.clone(),
            outcome: ApplyOutcome::Failed,
            error: Some(error),
        }
    }
}

/// Summary of applying one or more bundles
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplySummary {
    pub ok: usize,
    pub fixed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub reports: Vec<ItemReport>,
}

impl ApplySummary {
    /// Total number of items applied
    pub fn total(&self) -> usize {
        self.ok + self.fixed + self.skipped + self.failed
    }

    /// True when no item failed
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Record one report
    pub fn add_report(&mut self, report: ItemReport) {
        match report.outcome {
            ApplyOutcome::Ok => self.ok += 1,
            ApplyOutcome::Fixed => self.fixed += 1,
            ApplyOutcome::Skipped => self.skipped += 1,
            ApplyOutcome::Failed => self.failed += 1,
        }
        self.reports.push(report);
    }

    /// Merge another summary into this one
    pub fn merge(&mut self, other: ApplySummary) {
        for report in other.reports {
            self.add_report(report);
        }
    }
}

/// Options for applying a bundle
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Ask before fixing each incorrect item
    pub interactive: bool,
}

/// Apply every item of a bundle in declaration order
///
/// A failing item is recorded as [`ApplyOutcome::Failed`] with its error text
/// and the run continues with the next item. Only a failed confirmation
/// prompt aborts the bundle, since every later item would hit it too.
pub fn apply_bundle<P, C>(
    bundle: &Bundle,
    opts: &ApplyOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ApplySummary>
where
    P: ProgressCallback + ?Sized,
    C: ConfirmCallback,
{
    let mut summary = ApplySummary::default();
    progress.on_bundle_start(bundle.name(), bundle.len());

    for item in bundle.items() {
        progress.on_item_start(item.id());

        let mode = if opts.interactive {
            ApplyMode::Interactive(&mut *confirm)
        } else {
            ApplyMode::Unattended
        };

        let report = match item.apply(mode) {
            Ok(outcome) => ItemReport::new(item.id(), outcome),
            Err(e) if e.category() == ErrorCategory::Prompt => return Err(e),
            Err(e) => {
                log::error!("{}: {}: {}", item.id(), e.category().description(), e);
                ItemReport::failed(item.id(), e.to_string())
            }
        };

        progress.on_item_complete(&report);
        summary.add_report(report);
    }

    progress.on_bundle_complete(bundle.name());
    Ok(summary)
}

/// Apply a bundle unattended without progress reporting
pub fn apply_simple(bundle: &Bundle) -> Result<ApplySummary> {
    apply_bundle(
        bundle,
        &ApplyOptions::default(),
        &mut NoProgress,
        &mut AutoConfirm,
    )
}

/// Verdict for one item of `verify_bundle`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    pub id: ItemId,
    pub correct: bool,
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerifyReport {
    /// Whether `apply` would have something to do
    pub fn needs_fixing(&self) -> bool {
        self.error.is_some() || (!self.correct && !self.skipped)
    }
}

/// Check every item of a bundle without changing anything
pub fn verify_bundle(bundle: &Bundle) -> Vec<VerifyReport> {
    bundle
        .items()
        .iter()
        .map(|item| verify_item(item.as_ref()))
        .collect()
}

fn verify_item(item: &dyn Reconcile) -> VerifyReport {
    match item.verify() {
        Ok(v) => VerifyReport {
            id: item.id().clone(),
            correct: v.correct,
            skipped: v.skipped,
            diff: v.diff,
            error: None,
        },
        Err(e) => VerifyReport {
            id: item.id().clone(),
            correct: false,
            skipped: false,
            diff: None,
            error: Some(e.to_string()),
        },
    }
}
