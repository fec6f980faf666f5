//! `converge test` - check the inventory without contacting any node

use anyhow::Result;

use super::{build_target, load_inventory};
use crate::Context;
use crate::cli::NodeSelection;
use crate::ui;

pub fn run(ctx: &Context, args: NodeSelection) -> Result<()> {
    let inventory = load_inventory(ctx)?;

    let mut failed = 0;
    for (name, config) in inventory.select_nodes(&args.nodes)? {
        match build_target(&inventory, name, config) {
            Ok(target) => {
                if !ctx.quiet {
                    ui::success(&format!(
                        "{}: {} bundle(s), {} item(s)",
                        name,
                        target.bundles.len(),
                        target.item_count()
                    ));
                }
            }
            Err(e) => {
                failed += 1;
                ui::error(&format!("{e:#}"));
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} node(s) have configuration errors");
    }
    Ok(())
}
