//! Confirmation and progress provider traits
//!
//! These traits keep the engine free of any particular terminal UI. The
//! caller decides how a question is asked and how progress is shown.

use crate::error::Result;
use crate::executor::ItemReport;
use crate::item::ItemId;

/// Confirmation callback for interactive apply
///
/// Implementations may block for as long as the operator takes to answer.
/// There is no timeout; unattended runs simply do not ask.
pub trait ConfirmCallback: Send {
    /// Ask the operator to confirm a fix
    ///
    /// `prompt` contains the rendered change followed by the question.
    /// Returns `true` if the operator confirmed.
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}

/// Progress callback for applying a bundle
pub trait ProgressCallback: Send {
    /// Called before the first item of a bundle
    fn on_bundle_start(&mut self, bundle: &str, count: usize);

    /// Called when an item is about to be applied
    fn on_item_start(&mut self, id: &ItemId);

    /// Called when an item has been applied (or failed)
    fn on_item_complete(&mut self, report: &ItemReport);

    /// Called after the last item of a bundle
    fn on_bundle_complete(&mut self, bundle: &str);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_bundle_start(&mut self, _bundle: &str, _count: usize) {}
    fn on_item_start(&mut self, _id: &ItemId) {}
    fn on_item_complete(&mut self, _report: &ItemReport) {}
    fn on_bundle_complete(&mut self, _bundle: &str) {}
}

/// How `apply` handles an incorrect item
pub enum ApplyMode<'a> {
    /// Fix without asking
    Unattended,
    /// Render the change and fix only after confirmation
    Interactive(&'a mut dyn ConfirmCallback),
}
