//! `converge apply` - fix every incorrect item on the selected nodes

use anyhow::{Context as AnyhowContext, Result};
use itemkit::{
    ApplyOptions, ApplySummary, ConfirmCallback, NoProgress, ProgressCallback, apply_bundle,
};
use rayon::prelude::*;
use serde::Serialize;

use super::{Target, build_targets, load_inventory};
use crate::Context;
use crate::cli::ApplyArgs;
use crate::progress::ItemPrinter;
use crate::prompt::TerminalConfirm;
use crate::ui;

/// Result of applying one node
#[derive(Debug, Serialize)]
struct NodeResult {
    node: String,
    #[serde(flatten)]
    summary: ApplySummary,
    /// Set when the node's run was aborted
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl NodeResult {
    fn is_success(&self) -> bool {
        self.error.is_none() && self.summary.is_success()
    }
}

pub fn run(ctx: &Context, args: ApplyArgs) -> Result<()> {
    let inventory = load_inventory(ctx)?;
    let targets = build_targets(&inventory, &args.nodes)?;

    if targets.is_empty() {
        ui::warn("No nodes to apply");
        return Ok(());
    }

    let jobs = effective_jobs(args.interactive, args.jobs);
    let opts = ApplyOptions {
        interactive: args.interactive,
    };
    let output = Output {
        json: args.json,
        quiet: ctx.quiet,
        show_ok: ctx.verbose > 0,
        spinner: jobs == 1 && !args.interactive,
    };

    if !args.json && !ctx.quiet {
        ui::info(&format!(
            "Applying {} node(s) with {} job(s)",
            targets.len(),
            jobs
        ));
    }

    let results: Vec<NodeResult> = if jobs == 1 || targets.len() == 1 {
        targets
            .iter()
            .map(|target| apply_target(target, &opts, &output, &mut TerminalConfirm))
            .collect()
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("Failed to create apply thread pool")?;
        pool.install(|| {
            targets
                .par_iter()
                .map(|target| apply_target(target, &opts, &output, &mut TerminalConfirm))
                .collect()
        })
    };

    let mut total = ApplySummary::default();
    for result in &results {
        total.merge(result.summary.clone());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            if let Some(error) = &result.error {
                ui::error(&format!("{}: {}", result.node, error));
            }
        }
        if !ctx.quiet {
            ui::summary(&total);
        }
    }

    check_results(&results, &total)
}

/// Number of nodes applied at once
///
/// Interactive runs use one job so prompts from different nodes never
/// interleave.
fn effective_jobs(interactive: bool, jobs: usize) -> usize {
    if interactive { 1 } else { jobs.max(1) }
}

/// Fail the command when any node had a failed item or was aborted
fn check_results(results: &[NodeResult], total: &ApplySummary) -> Result<()> {
    let failed_nodes = results.iter().filter(|r| !r.is_success()).count();
    if failed_nodes > 0 {
        anyhow::bail!(
            "{} item(s) failed on {} node(s)",
            total.failed,
            failed_nodes
        );
    }
    Ok(())
}

/// How item results are shown
struct Output {
    json: bool,
    quiet: bool,
    show_ok: bool,
    spinner: bool,
}

impl Output {
    fn progress(&self, node: &str) -> Box<dyn ProgressCallback> {
        if self.json || self.quiet {
            Box::new(NoProgress)
        } else if self.spinner {
            Box::new(ItemPrinter::with_spinner(node, self.show_ok))
        } else {
            Box::new(ItemPrinter::plain(node, self.show_ok))
        }
    }
}

/// Apply every bundle of one node, in order
fn apply_target<C: ConfirmCallback>(
    target: &Target,
    opts: &ApplyOptions,
    output: &Output,
    confirm: &mut C,
) -> NodeResult {
    let mut progress = output.progress(&target.name);
    let mut result = NodeResult {
        node: target.name.clone(),
        summary: ApplySummary::default(),
        error: None,
    };

    for bundle in &target.bundles {
        match apply_bundle(bundle, opts, progress.as_mut(), confirm) {
            Ok(summary) => result.summary.merge(summary),
            Err(e) => {
                log::error!("{}: aborted: {}", target.name, e);
                result.error = Some(e.to_string());
                break;
            }
        }
    }

    result
}
