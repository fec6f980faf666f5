//! Symlink item - a symbolic link with owner and group

use crate::attributes::{ItemDescriptor, Value};
use crate::error::{Error, Result};
use crate::item::{Item, ItemId, ItemKind, ItemStatus};
use crate::node::{PathInfo, quote};
use regex::Regex;
use std::sync::LazyLock;

static DESCRIPTOR: LazyLock<ItemDescriptor> = LazyLock::new(|| {
    ItemDescriptor::new("symlink", "symlinks")
        .attribute("group", "root")
        .attribute("owner", "root")
        .attribute_without_default("target")
        .required("target")
        .depends_static("directory:")
        .validator("target", validate_target)
        .validator("owner", validate_account)
        .validator("group", validate_account)
});

static ACCOUNT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z_][A-Za-z0-9_.-]*\$?|[0-9]+)$").expect("account name pattern")
});

fn validate_target(_item: &ItemId, value: &Value) -> std::result::Result<(), String> {
    match value.as_str() {
        Some(target) if !target.is_empty() => Ok(()),
        Some(_) => Err("link target must not be empty".to_string()),
        None => Err("expected a path string".to_string()),
    }
}

fn validate_account(_item: &ItemId, value: &Value) -> std::result::Result<(), String> {
    let name = value
        .as_str()
        .ok_or_else(|| "expected a user or group name".to_string())?;
    if ACCOUNT_NAME.is_match(name) {
        Ok(())
    } else {
        Err(format!("'{name}' is not a valid user or group name"))
    }
}

/// One independently diffable aspect of a symlink
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Facet {
    /// The path is missing or is not a symlink
    Type,
    Owner,
    Group,
}

impl Facet {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Owner => "owner",
            Self::Group => "group",
        }
    }
}

/// A single remote mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixStep {
    /// Remove the path, create the link, set ownership
    Recreate,
    /// Set owner and group together
    Chown,
}

/// Turn flagged facets into the mutations that converge them
///
/// A wrong type recreates the link, which sets ownership as well, so it
/// covers every other facet. Owner and group share one `chown`.
pub fn fix_plan(needs_fixing: &[Facet]) -> Vec<FixStep> {
    if needs_fixing.contains(&Facet::Type) {
        return vec![FixStep::Recreate];
    }

    let mut steps = Vec::new();
    for facet in needs_fixing {
        let step = match facet {
            Facet::Owner | Facet::Group => FixStep::Chown,
            Facet::Type => FixStep::Recreate,
        };
        if !steps.contains(&step) {
            steps.push(step);
        }
    }
    steps
}

/// What `get_status` found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymlinkInfo {
    pub needs_fixing: Vec<Facet>,
    pub path_info: PathInfo,
}

/// Symbolic link item kind
///
/// Attributes: `target` (required), `owner` and `group` (default "root").
#[derive(Debug, Clone, Copy, Default)]
pub struct Symlink;

impl Symlink {
    fn owner(item: &Item<Self>) -> &str {
        item.attribute_str("owner").unwrap_or("root")
    }

    fn group(item: &Item<Self>) -> &str {
        item.attribute_str("group").unwrap_or("root")
    }

    fn fix_owner(item: &Item<Self>) -> Result<()> {
        item.node().run_checked(&format!(
            "chown -h {}:{} {}",
            quote(Self::owner(item)),
            quote(Self::group(item)),
            quote(item.name()),
        ))?;
        Ok(())
    }

    fn fix_type(item: &Item<Self>) -> Result<()> {
        let target = item
            .attribute_str("target")
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::MissingRequiredAttribute {
                item: item.id().clone(),
                names: vec!["target".to_string()],
            })?;
        item.node()
            .run_checked(&format!("rm -rf {}", quote(item.name())))?;
        item.node().run_checked(&format!(
            "ln -s {} {}",
            quote(target),
            quote(item.name())
        ))?;
        Self::fix_owner(item)
    }
}

impl ItemKind for Symlink {
    type Info = SymlinkInfo;

    fn descriptor(&self) -> &ItemDescriptor {
        &DESCRIPTOR
    }

    fn get_status(&self, item: &Item<Self>) -> Result<ItemStatus<SymlinkInfo>> {
        let path_info = item.node().path_info(item.name())?;
        let mut needs_fixing = Vec::new();

        if !path_info.is_symlink {
            needs_fixing.push(Facet::Type);
        } else {
            if !path_info.owner_is(Self::owner(item)) {
                needs_fixing.push(Facet::Owner);
            }
            if !path_info.group_is(Self::group(item)) {
                needs_fixing.push(Facet::Group);
            }
        }

        Ok(ItemStatus::new(
            needs_fixing.is_empty(),
            SymlinkInfo {
                needs_fixing,
                path_info,
            },
        ))
    }

    fn ask(&self, item: &Item<Self>, status: &ItemStatus<SymlinkInfo>) -> String {
        let info = &status.info;
        if info.needs_fixing.contains(&Facet::Type) {
            if !info.path_info.exists {
                return "Doesn't exist.".to_string();
            }
            return format!("type {} → symlink", info.path_info.desc);
        }

        let mut lines = Vec::new();
        for facet in &info.needs_fixing {
            match facet {
                Facet::Owner => lines.push(format!(
                    "owner {} → {}",
                    info.path_info.owner,
                    Self::owner(item)
                )),
                Facet::Group => lines.push(format!(
                    "group {} → {}",
                    info.path_info.group,
                    Self::group(item)
                )),
                Facet::Type => {}
            }
        }
        lines.join("\n")
    }

    fn fix(&self, item: &Item<Self>, status: &ItemStatus<SymlinkInfo>) -> Result<()> {
        for step in fix_plan(&status.info.needs_fixing) {
            match step {
                FixStep::Recreate => {
                    log::info!("{}:{}: fixing type...", item.node().name(), item.id());
                    Self::fix_type(item)?;
                }
                FixStep::Chown => {
                    let facets: Vec<&str> = status
                        .info
                        .needs_fixing
                        .iter()
                        .map(Facet::as_str)
                        .collect();
                    log::info!(
                        "{}:{}: fixing {}...",
                        item.node().name(),
                        item.id(),
                        facets.join(", ")
                    );
                    Self::fix_owner(item)?;
                }
            }
        }
        Ok(())
    }
}
