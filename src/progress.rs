//! Progress reporting for apply runs

use crate::ui;
use indicatif::{ProgressBar, ProgressStyle};
use itemkit::{ApplyOutcome, ItemId, ItemReport, ProgressCallback};
use std::time::Duration;

/// Prints one line per applied item, optionally behind a spinner
///
/// The spinner is only used when a single node is applied at a time and
/// nothing else writes to the terminal (no prompts).
pub struct ItemPrinter {
    node: String,
    spinner: Option<ProgressBar>,
    /// Also print items that were already correct
    show_ok: bool,
}

impl ItemPrinter {
    pub fn plain(node: &str, show_ok: bool) -> Self {
        Self {
            node: node.to_string(),
            spinner: None,
            show_ok,
        }
    }

    pub fn with_spinner(node: &str, show_ok: bool) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        Self {
            node: node.to_string(),
            spinner: Some(pb),
            show_ok,
        }
    }

    fn print(&self, line: &str) {
        match &self.spinner {
            Some(pb) => pb.println(line),
            None => println!("{line}"),
        }
    }

    /// Remove the spinner from the terminal
    pub fn finish(&self) {
        if let Some(pb) = &self.spinner {
            pb.finish_and_clear();
        }
    }
}

impl ProgressCallback for ItemPrinter {
    fn on_bundle_start(&mut self, bundle: &str, count: usize) {
        log::info!("{}: applying bundle '{}' ({} items)", self.node, bundle, count);
    }

    fn on_item_start(&mut self, id: &ItemId) {
        if let Some(pb) = &self.spinner {
            pb.set_message(format!("{}: {}", self.node, id));
        }
    }

    fn on_item_complete(&mut self, report: &ItemReport) {
        if report.outcome != ApplyOutcome::Ok || self.show_ok {
            self.print(&ui::report_line(&self.node, report));
        }
    }

    fn on_bundle_complete(&mut self, bundle: &str) {
        log::debug!("{}: bundle '{}' done", self.node, bundle);
    }
}

impl Drop for ItemPrinter {
    fn drop(&mut self) {
        self.finish();
    }
}
