//! Built-in item kinds and the registry that maps bundle sections to them

pub mod symlink;

pub use symlink::Symlink;

use crate::attributes::Attributes;
use crate::error::{Error, Result};
use crate::item::{BoxedItem, Item, ItemKind};
use crate::node::Node;
use std::sync::Arc;

/// Bundle section names of every built-in item kind (e.g. "symlinks")
pub fn bundle_attribute_names() -> Vec<&'static str> {
    vec![Symlink.descriptor().bundle_attribute_name()]
}

/// Build a validated item from a bundle section entry
///
/// `section` is the bundle attribute name the entry was declared under.
pub fn build_item(
    bundle: &str,
    node: Arc<dyn Node>,
    section: &str,
    name: &str,
    attributes: Attributes,
) -> Result<BoxedItem> {
    match section {
        "symlinks" => Ok(Box::new(Item::new(bundle, node, Symlink, name, attributes)?)),
        _ => Err(Error::UnknownItemType {
            bundle: bundle.to_string(),
            section: section.to_string(),
            known: bundle_attribute_names().join(", "),
        }),
    }
}
