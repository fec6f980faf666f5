pub mod apply;
pub mod nodes;
pub mod validate;
pub mod verify;

use anyhow::{Context as AnyhowContext, Result};
use itemkit::Bundle;

use crate::Context;
use crate::config::{Inventory, NodeConfig};
use crate::paths;
use crate::transport;

/// A node with its bundles, built and checked
pub struct Target {
    pub name: String,
    pub bundles: Vec<Bundle>,
}

impl Target {
    pub fn item_count(&self) -> usize {
        self.bundles.iter().map(Bundle::len).sum()
    }
}

/// Load the inventory from `--config` or the default location
pub fn load_inventory(ctx: &Context) -> Result<Inventory> {
    let path = paths::inventory_path(ctx.config.as_deref())?;
    log::debug!("Loading inventory from {}", path.display());
    Inventory::load(&path)
}

/// Build every selected node and its bundles
///
/// Item validation and bundle collision checks happen here, so a
/// configuration error stops the run before any node is touched.
pub fn build_targets(inventory: &Inventory, names: &[String]) -> Result<Vec<Target>> {
    inventory
        .select_nodes(names)?
        .into_iter()
        .map(|(name, config)| build_target(inventory, name, config))
        .collect()
}

pub fn build_target(inventory: &Inventory, name: &str, config: &NodeConfig) -> Result<Target> {
    let node = transport::connect(name, config);
    let bundles = config
        .bundles
        .iter()
        .map(|bundle| {
            let declarations = inventory.declarations(bundle)?;
            Bundle::from_declarations(bundle, node.clone(), declarations)
                .with_context(|| format!("node '{name}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Target {
        name: name.to_string(),
        bundles,
    })
}
