//! `converge nodes` - list nodes and their bundles

use anyhow::Result;
use colored::Colorize;

use super::load_inventory;
use crate::Context;
use crate::config::NodeConfig;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let inventory = load_inventory(ctx)?;

    if inventory.nodes.is_empty() {
        ui::warn("No nodes in inventory");
        return Ok(());
    }

    ui::header("Nodes");
    for (name, config) in &inventory.nodes {
        println!();
        println!("  {}", name.bold());
        ui::kv("  transport", &describe_transport(name, config));
        if config.bundles.is_empty() {
            ui::kv("  bundles", &"none".dimmed().to_string());
        }
        for bundle in &config.bundles {
            let items = inventory.declarations(bundle)?.len();
            ui::kv("  bundle", &format!("{bundle} ({items} items)"));
        }
    }
    Ok(())
}

fn describe_transport(name: &str, config: &NodeConfig) -> String {
    if config.is_local(name) {
        return "local".to_string();
    }
    let hostname = config.hostname(name);
    let mut dest = match &config.user {
        Some(user) => format!("ssh {user}@{hostname}"),
        None => format!("ssh {hostname}"),
    };
    if let Some(port) = config.port {
        dest.push_str(&format!(":{port}"));
    }
    dest
}
