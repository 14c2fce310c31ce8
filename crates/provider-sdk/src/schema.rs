//! Schema declarations for providers and resources

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diagnostics::Diagnostics;
use crate::sensitive::REDACTED;
use crate::value::AttributePath;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    #[default]
    String,
    Bool,
    Number,
}

impl AttributeType {
    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Number => "number",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Bool => value.is_boolean(),
            Self::Number => value.is_number(),
        }
    }
}

/// A single attribute of a schema. Build one with [`Attribute::string`] and the builder methods.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub kind: AttributeType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub computed: bool,
    /// Never printed in logs or plan output
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub markdown_description: String,
}

impl Attribute {
    pub fn string() -> Self {
        Self {
            kind: AttributeType::String,
            ..Default::default()
        }
    }

    pub fn bool() -> Self {
        Self {
            kind: AttributeType::Bool,
            ..Default::default()
        }
    }

    pub fn number() -> Self {
        Self {
            kind: AttributeType::Number,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    #[must_use]
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Value used when the attribute is unset in configuration. Only meaningful for optional
    /// and computed attributes.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn markdown_description(mut self, description: impl Into<String>) -> Self {
        self.markdown_description = description.into();
        self
    }

    /// Whether practitioners may set this attribute in configuration
    pub fn is_configurable(&self) -> bool {
        self.required || self.optional
    }
}

/// The schema of a resource or of the provider configuration
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Schema {
    #[serde(default)]
    pub version: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub markdown_description: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Attribute>,
}

impl Schema {
    /// An empty version 0 schema
    pub fn v0() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_markdown_description(mut self, description: impl Into<String>) -> Self {
        self.markdown_description = description.into();
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Fills every unset (missing or null) attribute that declares a default. A null value
    /// becomes an empty object first.
    pub fn apply_defaults(&self, value: &mut Value) {
        if value.is_null() {
            *value = Value::Object(Default::default());
        }
        let Value::Object(map) = value else {
            return;
        };
        for (name, attribute) in &self.attributes {
            let Some(default) = &attribute.default else {
                continue;
            };
            let current = map.entry(name.clone()).or_insert(Value::Null);
            if current.is_null() {
                *current = default.clone();
            }
        }
    }

    /// Returns a copy of `value` safe to log or display: every non-null sensitive attribute is
    /// replaced with a placeholder
    pub fn redact(&self, value: &Value) -> Value {
        let mut redacted = value.clone();
        if let Value::Object(map) = &mut redacted {
            for (name, attribute) in self.attributes.iter().filter(|(_, a)| a.sensitive) {
                if let Some(v) = map.get_mut(name) {
                    if !v.is_null() {
                        *v = Value::String(REDACTED.to_string());
                    }
                }
            }
        }
        redacted
    }

    /// Checks a configuration object against the schema: unknown attributes, missing required
    /// attributes, values set on computed-only attributes and type mismatches are errors
    pub fn validate_config(&self, value: &Value) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let map = match value {
            Value::Object(map) => map,
            Value::Null => {
                for (name, _) in self.attributes.iter().filter(|(_, a)| a.required) {
                    diags.add_attribute_error(
                        AttributePath::root(name.as_str()),
                        "missing required attribute",
                        format!("the attribute `{name}` is required"),
                    );
                }
                return diags;
            }
            other => {
                diags.add_error(
                    "invalid configuration",
                    format!("expected an object, found `{other}`"),
                );
                return diags;
            }
        };

        for (name, value) in map {
            let path = AttributePath::root(name.as_str());
            let Some(attribute) = self.attributes.get(name) else {
                diags.add_attribute_error(
                    path,
                    "unsupported attribute",
                    format!("an attribute named `{name}` is not expected here"),
                );
                continue;
            };
            if value.is_null() {
                continue;
            }
            if !attribute.is_configurable() {
                diags.add_attribute_error(
                    path,
                    "invalid configuration",
                    format!("`{name}` is computed and cannot be set"),
                );
            } else if !attribute.kind.accepts(value) {
                diags.add_attribute_error(
                    path,
                    "incorrect attribute value type",
                    format!("`{name}` must be a {}", attribute.kind.name()),
                );
            }
        }

        for (name, _) in self.attributes.iter().filter(|(_, a)| a.required) {
            if map.get(name).map_or(true, Value::is_null) {
                diags.add_attribute_error(
                    AttributePath::root(name.as_str()),
                    "missing required attribute",
                    format!("the attribute `{name}` is required"),
                );
            }
        }
        diags
    }
}
