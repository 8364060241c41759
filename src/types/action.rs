//! Human decisions submitted from the UI.

use serde::{Deserialize, Serialize};

/// An action taken by the user on a rendered UI, e.g. a button click.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserAction {
    pub action_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Map<String, serde_json::Value>>,
}

impl UserAction {
    pub fn new(action_id: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Map<String, serde_json::Value>) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Tool result body reported back to the model for a render call that
    /// waited on this decision.
    pub fn to_result_value(&self) -> serde_json::Value {
        let mut value = serde_json::json!({
            "type": "userAction",
            "actionId": self.action_id,
        });
        if let Some(payload) = &self.payload {
            value["payload"] = serde_json::Value::Object(payload.clone());
        }
        value
    }
}
