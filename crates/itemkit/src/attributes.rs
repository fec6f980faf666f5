//! Attribute declaration, validation and merging
//!
//! Every item type publishes an [`ItemDescriptor`]: its legal attribute
//! names with their defaults, the names that must be supplied explicitly,
//! the dependencies every item of the type has, and validators keyed by
//! attribute name. Validators are scoped to the descriptor, so two item
//! types can validate an attribute of the same name differently.

use crate::error::{Error, Result};
use crate::item::ItemId;
use std::collections::{BTreeMap, HashMap};

/// An attribute value as declared in configuration
pub type Value = serde_json::Value;

/// Attribute name to value, ordered by name
pub type Attributes = BTreeMap<String, Value>;

/// Checks one attribute value; the error string is the reason shown to the user
pub type Validator = fn(&ItemId, &Value) -> std::result::Result<(), String>;

/// Attribute names every item type accepts
pub const RESERVED_ATTRIBUTES: [&str; 2] = ["depends", "unless"];

/// Validator used for attributes without a registered one
pub fn accept_any(_item: &ItemId, _value: &Value) -> std::result::Result<(), String> {
    Ok(())
}

/// `unless` must be a shell command string
fn validate_unless(_item: &ItemId, value: &Value) -> std::result::Result<(), String> {
    match value.as_str() {
        Some(cmd) if !cmd.trim().is_empty() => Ok(()),
        Some(_) => Err("command must not be empty".to_string()),
        None => Err("expected a command string".to_string()),
    }
}

/// `depends` must be a list of `type:name` (or `type:`) selectors
fn validate_depends(_item: &ItemId, value: &Value) -> std::result::Result<(), String> {
    let list = value
        .as_array()
        .ok_or_else(|| "expected a list of item selectors".to_string())?;

    for entry in list {
        let selector = entry
            .as_str()
            .ok_or_else(|| format!("selector {entry} is not a string"))?;
        match selector.split_once(':') {
            Some((item_type, _)) if !item_type.is_empty() => {}
            _ => return Err(format!("'{selector}' is not of the form type:name")),
        }
    }
    Ok(())
}

/// Render a value for error messages
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{s}\""),
        other => other.to_string(),
    }
}

/// Static description of an item type
#[derive(Debug, Clone)]
pub struct ItemDescriptor {
    type_name: &'static str,
    bundle_attribute_name: &'static str,
    attributes: Attributes,
    required: Vec<String>,
    depends_static: Vec<String>,
    validators: HashMap<String, Validator>,
}

impl ItemDescriptor {
    /// Describe an item type
    ///
    /// `bundle_attribute_name` is the section name bundles use to declare
    /// items of this type (e.g. "symlinks").
    pub fn new(type_name: &'static str, bundle_attribute_name: &'static str) -> Self {
        Self {
            type_name,
            bundle_attribute_name,
            attributes: Attributes::new(),
            required: Vec::new(),
            depends_static: Vec::new(),
            validators: HashMap::new(),
        }
    }

    /// Declare an attribute with a default value
    pub fn attribute(mut self, name: &str, default: impl Into<Value>) -> Self {
        self.attributes.insert(name.to_string(), default.into());
        self
    }

    /// Declare an attribute that has no default
    pub fn attribute_without_default(self, name: &str) -> Self {
        self.attribute(name, Value::Null)
    }

    /// Require an attribute to be supplied explicitly
    pub fn required(mut self, name: &str) -> Self {
        if !self.required.iter().any(|r| r == name) {
            self.required.push(name.to_string());
        }
        self
    }

    /// Add a dependency selector every item of this type has
    pub fn depends_static(mut self, selector: &str) -> Self {
        self.depends_static.push(selector.to_string());
        self
    }

    /// Register a validator for an attribute name
    pub fn validator(mut self, name: &str, validator: Validator) -> Self {
        self.validators.insert(name.to_string(), validator);
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn bundle_attribute_name(&self) -> &'static str {
        self.bundle_attribute_name
    }

    /// Declared attributes with their defaults
    pub fn defaults(&self) -> &Attributes {
        &self.attributes
    }

    pub fn required_attributes(&self) -> &[String] {
        &self.required
    }

    pub fn static_dependencies(&self) -> &[String] {
        &self.depends_static
    }

    /// Whether `name` may appear in an item of this type
    pub fn accepts(&self, name: &str) -> bool {
        self.attributes.contains_key(name) || RESERVED_ATTRIBUTES.contains(&name)
    }

    /// Look up the validator for an attribute name
    ///
    /// Falls back to the built-in validators of the reserved attributes and
    /// then to [`accept_any`].
    pub fn validator_for(&self, name: &str) -> Validator {
        if let Some(validator) = self.validators.get(name) {
            return *validator;
        }
        match name {
            "unless" => validate_unless,
            "depends" => validate_depends,
            _ => accept_any,
        }
    }

    /// Run every check on supplied attributes
    pub fn validate(&self, item: &ItemId, supplied: &Attributes) -> Result<()> {
        self.validate_attribute_names(item, supplied)?;
        self.validate_required_attributes(item, supplied)?;
        self.validate_values(item, supplied)
    }

    /// Reject attribute names the type does not declare
    pub fn validate_attribute_names(&self, item: &ItemId, supplied: &Attributes) -> Result<()> {
        match supplied.keys().find(|name| !self.accepts(name)) {
            Some(name) => Err(Error::InvalidAttributeName {
                item: item.clone(),
                name: name.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Require every required attribute to be supplied (defaults don't count)
    pub fn validate_required_attributes(
        &self,
        item: &ItemId,
        supplied: &Attributes,
    ) -> Result<()> {
        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|name| !supplied.contains_key(name.as_str()))
            .cloned()
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingRequiredAttribute {
                item: item.clone(),
                names: missing,
            })
        }
    }

    /// Run the per-name validators over supplied values
    pub fn validate_values(&self, item: &ItemId, supplied: &Attributes) -> Result<()> {
        for (name, value) in supplied {
            self.validator_for(name)(item, value).map_err(|reason| {
                Error::InvalidAttributeValue {
                    item: item.clone(),
                    name: name.clone(),
                    value: display_value(value),
                    reason,
                }
            })?;
        }
        Ok(())
    }

    /// Overlay supplied values onto the defaults
    ///
    /// Reserved attributes are not part of the result; the item keeps them
    /// separately.
    pub fn merge(&self, supplied: &Attributes) -> Attributes {
        let mut merged = self.attributes.clone();
        for (name, value) in supplied {
            if !RESERVED_ATTRIBUTES.contains(&name.as_str()) {
                merged.insert(name.clone(), value.clone());
            }
        }
        merged
    }
}
