//! JSON-schema parameter definitions for tool declarations.

use serde::{Deserialize, Serialize};

/// JSON Schema-based parameter definition for a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolParameters {
    /// JSON Schema object describing the parameters.
    pub schema: serde_json::Value,
}

impl ToolParameters {
    /// Create an empty parameter schema (no parameters).
    pub fn empty() -> Self {
        Self {
            schema: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": [],
            }),
        }
    }

    /// Builder: create an object schema with properties.
    pub fn object() -> ParameterBuilder {
        ParameterBuilder {
            properties: serde_json::Map::new(),
            required: Vec::new(),
        }
    }
}

/// Builder for constructing tool parameter schemas.
pub struct ParameterBuilder {
    properties: serde_json::Map<String, serde_json::Value>,
    required: Vec<String>,
}

impl ParameterBuilder {
    fn property(mut self, name: impl Into<String>, schema: serde_json::Value, required: bool) -> Self {
        let name = name.into();
        self.properties.insert(name.clone(), schema);
        if required {
            self.required.push(name);
        }
        self
    }

    /// Add a string property.
    pub fn string(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        let schema = serde_json::json!({
            "type": "string",
            "description": description.into(),
        });
        self.property(name, schema, required)
    }

    /// Add a boolean property.
    pub fn boolean(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        let schema = serde_json::json!({
            "type": "boolean",
            "description": description.into(),
        });
        self.property(name, schema, required)
    }

    /// Add an enum (string) property.
    pub fn string_enum(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        values: &[&str],
        required: bool,
    ) -> Self {
        let schema = serde_json::json!({
            "type": "string",
            "description": description.into(),
            "enum": values,
        });
        self.property(name, schema, required)
    }

    /// Add an array of strings.
    pub fn string_array(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        let schema = serde_json::json!({
            "type": "array",
            "description": description.into(),
            "items": { "type": "string" },
        });
        self.property(name, schema, required)
    }

    /// Add a property with a caller-supplied schema.
    pub fn raw(self, name: impl Into<String>, schema: serde_json::Value, required: bool) -> Self {
        self.property(name, schema, required)
    }

    /// Build into ToolParameters.
    pub fn build(self) -> ToolParameters {
        ToolParameters {
            schema: serde_json::json!({
                "type": "object",
                "properties": self.properties,
                "required": self.required,
            }),
        }
    }
}
