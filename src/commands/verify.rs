//! `converge verify` - show what apply would change, without changing it

use anyhow::Result;
use colored::Colorize;
use itemkit::verify_bundle;

use super::{build_targets, load_inventory};
use crate::Context;
use crate::cli::NodeSelection;
use crate::ui;

pub fn run(ctx: &Context, args: NodeSelection) -> Result<()> {
    let inventory = load_inventory(ctx)?;
    let targets = build_targets(&inventory, &args.nodes)?;

    let mut incorrect = 0;
    for target in &targets {
        ui::header(&target.name);

        for bundle in &target.bundles {
            for report in verify_bundle(bundle) {
                if let Some(error) = &report.error {
                    incorrect += 1;
                    println!("{} {} ({})", "✗".red(), report.id, error.red());
                } else if report.needs_fixing() {
                    incorrect += 1;
                    println!("{} {}", "✗".red(), report.id);
                    for line in report.diff.as_deref().unwrap_or_default().lines() {
                        ui::dim(line);
                    }
                } else if report.skipped {
                    println!("{} {} {}", "⊘".yellow(), report.id, "skipped".dimmed());
                } else if ctx.verbose > 0 {
                    println!("{} {}", "✓".green(), report.id);
                }
            }
        }
    }

    println!();
    if incorrect > 0 {
        anyhow::bail!("{incorrect} item(s) need fixing");
    }
    ui::success("All items are correct");
    Ok(())
}
