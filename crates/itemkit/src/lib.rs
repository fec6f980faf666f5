//! # itemkit
//!
//! The item reconciliation engine behind `converge`.
//!
//! Desired machine state is declared as typed items grouped into bundles.
//! Each item inspects its node, describes how the node differs from the
//! declaration and runs the smallest set of commands that converges it,
//! optionally after asking an operator.
//!
//! ## Core Concepts
//!
//! - **ItemDescriptor**: declared attributes, defaults, required names and
//!   validators of one item type
//! - **ItemKind**: the variant-specific `get_status` / `ask` / `fix`
//! - **Item**: identity plus validated attributes; owns the `apply` state
//!   machine
//! - **Bundle**: items of one node, unique by type and name
//! - **Node**: where commands run (local shell, ssh, or a test double)
//!
//! ## Example
//!
//! ```ignore
//! use itemkit::{apply_simple, Bundle, ItemDeclaration};
//!
//! let bundle = Bundle::from_declarations("base", node, vec![ItemDeclaration {
//!     section: "symlinks".into(),
//!     name: "/etc/localtime".into(),
//!     attributes: serde_json::from_value(serde_json::json!({
//!         "target": "/usr/share/zoneinfo/UTC",
//!     }))?,
//! }])?;
//!
//! let summary = apply_simple(&bundle)?;
//! assert!(summary.is_success());
//! ```
//!
//! ## Provider Traits
//!
//! - [`Node`]: runs shell commands on a managed host
//! - [`ConfirmCallback`]: answers interactive fix questions
//! - [`ProgressCallback`]: receives progress updates
//!
//! The crate has no terminal UI or transport of its own.

pub mod attributes;
pub mod bundle;
pub mod context;
pub mod error;
pub mod executor;
pub mod item;
pub mod items;
pub mod node;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use attributes::{Attributes, ItemDescriptor, RESERVED_ATTRIBUTES, Validator, Value};
pub use bundle::{Bundle, ItemDeclaration};
pub use context::{
    ApplyMode, AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback,
};
pub use error::{Error, ErrorCategory, Result};
pub use executor::{
    ApplyOptions, ApplySummary, ItemReport, VerifyReport, apply_bundle, apply_simple,
    verify_bundle,
};
pub use item::{
    ApplyOutcome, BoxedItem, Item, ItemId, ItemKind, ItemStatus, Reconcile, Verification,
    check_bundle_collisions,
};
pub use items::{Symlink, build_item};
pub use node::{Node, PathInfo, RunResult, quote};
