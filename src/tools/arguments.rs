//! Typed access to tool call arguments.

use serde::de::DeserializeOwned;

use crate::error::GenUiError;

/// Wrapper around tool call arguments providing typed extraction.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(value: serde_json::Value) -> Self {
        // Providers send `null` for argument-less calls.
        let value = if value.is_null() {
            serde_json::Value::Object(Default::default())
        } else {
            value
        };
        Self { value }
    }

    /// Deserialize the whole argument object into a request type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, GenUiError> {
        serde_json::from_value(self.value.clone())
            .map_err(|e| GenUiError::InvalidArgument(e.to_string()))
    }
}
