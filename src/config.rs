//! Inventory: the TOML file declaring nodes and bundles
//!
//! ```toml
//! [nodes.web1]
//! hostname = "web1.example.com"
//! user = "deploy"
//! bundles = ["base"]
//!
//! [[bundles.base.symlinks]]
//! name = "/etc/localtime"
//! target = "/usr/share/zoneinfo/UTC"
//! ```
//!
//! Sections of a bundle are read in name order; entries of a section keep
//! their declaration order.

use anyhow::{Context, Result};
use itemkit::{Attributes, ItemDeclaration};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeConfig>,
    #[serde(default)]
    pub bundles: BTreeMap<String, BundleConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    /// Host to connect to, defaulting to the node name; "localhost" runs
    /// commands locally
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub bundles: Vec<String>,
}

impl NodeConfig {
    /// Host for the node called `name`
    pub fn hostname<'a>(&'a self, name: &'a str) -> &'a str {
        self.hostname.as_deref().unwrap_or(name)
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.hostname(name) == "localhost"
    }
}

/// Bundle section name (e.g. "symlinks") to its entries
pub type BundleConfig = BTreeMap<String, Vec<ItemEntry>>;

/// One entry of a bundle section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemEntry {
    pub name: String,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl Inventory {
    /// Load the inventory from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read inventory {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid inventory {}", path.display()))
    }

    /// Parse and check inventory TOML
    pub fn parse(content: &str) -> Result<Self> {
        let inventory: Self = toml::from_str(content)?;
        inventory.check_references()?;
        Ok(inventory)
    }

    /// Every bundle a node lists must be declared
    fn check_references(&self) -> Result<()> {
        for (node, config) in &self.nodes {
            for bundle in &config.bundles {
                if !self.bundles.contains_key(bundle) {
                    anyhow::bail!("node '{}' references unknown bundle '{}'", node, bundle);
                }
            }
        }
        Ok(())
    }

    /// Nodes named on the command line, or all nodes when none are named
    pub fn select_nodes(&self, names: &[String]) -> Result<Vec<(&str, &NodeConfig)>> {
        if names.is_empty() {
            return Ok(self
                .nodes
                .iter()
                .map(|(name, config)| (name.as_str(), config))
                .collect());
        }

        names
            .iter()
            .map(|name| {
                self.nodes
                    .get_key_value(name)
                    .map(|(name, config)| (name.as_str(), config))
                    .with_context(|| format!("No such node: {name}"))
            })
            .collect()
    }

    /// Item declarations of a bundle, ready to be built into items
    pub fn declarations(&self, bundle: &str) -> Result<Vec<ItemDeclaration>> {
        let sections = self
            .bundles
            .get(bundle)
            .with_context(|| format!("No such bundle: {bundle}"))?;

        Ok(sections
            .iter()
            .flat_map(|(section, entries)| {
                entries.iter().map(move |entry| ItemDeclaration {
                    section: section.clone(),
                    name: entry.name.clone(),
                    attributes: entry.attributes.clone(),
                })
            })
            .collect())
    }
}
