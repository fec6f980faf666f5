//! Error types for item construction and reconciliation.
//!
//! Configuration errors (attribute names, required attributes, attribute
//! values, duplicate items, unknown item types) are raised before anything
//! touches a node. Execution errors come from the node while fixing.

use crate::item::ItemId;
use thiserror::Error;

/// Categories of errors, used by callers to decide how far a failure reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The declared configuration is wrong; nothing was attempted
    Configuration,
    /// A command on the node failed or could not be run
    Execution,
    /// Interactive confirmation could not be obtained
    Prompt,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Configuration => "Configuration error",
            Self::Execution => "Remote execution failed",
            Self::Prompt => "Confirmation failed",
        }
    }
}

/// Errors raised by the item engine.
#[derive(Debug, Error)]
pub enum Error {
    /// An attribute name the item type does not declare
    #[error("{item}: invalid attribute name '{name}'")]
    InvalidAttributeName {
        /// Item the attribute was supplied for
        item: ItemId,
        /// The offending attribute name
        name: String,
    },

    /// Required attributes that were not supplied explicitly
    #[error("{item}: missing required attribute(s): {}", .names.join(", "))]
    MissingRequiredAttribute {
        /// Item missing the attributes
        item: ItemId,
        /// Every required name that was not supplied
        names: Vec<String>,
    },

    /// An attribute value rejected by its validator
    #[error("{item}: invalid value for attribute '{name}' ({value}): {reason}")]
    InvalidAttributeValue {
        /// Item the attribute was supplied for
        item: ItemId,
        /// Attribute name
        name: String,
        /// Rendered value
        value: String,
        /// Why the validator rejected it
        reason: String,
    },

    /// Two items in one bundle share the same type and name
    #[error("duplicate item in bundle '{}': {first} collides with {second}", .first.bundle)]
    DuplicateItem {
        /// The item declared first
        first: ItemId,
        /// The item that collides with it
        second: ItemId,
    },

    /// A bundle section that does not name a known item type
    #[error("bundle '{bundle}': unknown item type '{section}' (known: {known})")]
    UnknownItemType {
        /// Bundle declaring the section
        bundle: String,
        /// Section name as written in the bundle
        section: String,
        /// Comma-separated sections the engine understands
        known: String,
    },

    /// A mutating command returned a non-zero result code
    #[error("{node}: command failed with code {return_code}: {command}{}", stderr_suffix(.stderr))]
    CommandFailed {
        /// Node the command ran on
        node: String,
        /// The shell command
        command: String,
        /// Result code reported by the node
        return_code: i32,
        /// Captured standard error
        stderr: String,
    },

    /// The node could not run the command at all
    #[error("{node}: could not run command: {message}")]
    Transport {
        /// Node the command was meant for
        node: String,
        /// Description of the transport failure
        message: String,
    },

    /// Output from the node could not be understood
    #[error("{node}: unexpected output for '{path}': {output}")]
    UnexpectedOutput {
        /// Node that produced the output
        node: String,
        /// Path being inspected
        path: String,
        /// The output that could not be parsed
        output: String,
    },

    /// The confirmation prompt failed
    #[error("confirmation failed: {0}")]
    Prompt(String),
}

fn stderr_suffix(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(" ({stderr})")
    }
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidAttributeName { .. }
            | Error::MissingRequiredAttribute { .. }
            | Error::InvalidAttributeValue { .. }
            | Error::DuplicateItem { .. }
            | Error::UnknownItemType { .. } => ErrorCategory::Configuration,
            Error::CommandFailed { .. }
            | Error::Transport { .. }
            | Error::UnexpectedOutput { .. } => ErrorCategory::Execution,
            Error::Prompt(_) => ErrorCategory::Prompt,
        }
    }
}

/// Result type for item operations.
pub type Result<T> = std::result::Result<T, Error>;
