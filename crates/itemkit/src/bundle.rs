//! Bundles: named collections of items on one node
//!
//! A bundle is the scope in which item identities must be unique. The check
//! runs when the bundle is built, so a collision is a configuration error
//! and never a silent overwrite at apply time.

use crate::attributes::Attributes;
use crate::error::Result;
use crate::item::{BoxedItem, check_bundle_collisions};
use crate::items::build_item;
use crate::node::Node;
use std::sync::Arc;

/// One declared entry of a bundle section, before validation
#[derive(Debug, Clone)]
pub struct ItemDeclaration {
    /// Bundle attribute name, e.g. "symlinks"
    pub section: String,
    pub name: String,
    pub attributes: Attributes,
}

/// A collision-checked collection of items
#[derive(Debug)]
pub struct Bundle {
    name: String,
    items: Vec<BoxedItem>,
}

impl Bundle {
    /// Create a bundle from already-built items
    pub fn new(name: &str, items: Vec<BoxedItem>) -> Result<Self> {
        check_bundle_collisions(&items)?;
        Ok(Self {
            name: name.to_string(),
            items,
        })
    }

    /// Build and validate every declared item, then check for collisions
    pub fn from_declarations(
        name: &str,
        node: Arc<dyn Node>,
        declarations: Vec<ItemDeclaration>,
    ) -> Result<Self> {
        let items = declarations
            .into_iter()
            .map(|d| build_item(name, node.clone(), &d.section, &d.name, d.attributes))
            .collect::<Result<Vec<_>>>()?;
        Self::new(name, items)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Items in declaration order
    pub fn items(&self) -> &[BoxedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
