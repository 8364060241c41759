//! Conversation types exchanged with the reasoning provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One role-tagged unit of conversation content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    pub role: Role,
    pub parts: Vec<TurnPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ConversationTurn {
    /// Create a user turn carrying plain text.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![TurnPart::Text { text: text.into() }],
            timestamp: Some(Utc::now()),
        }
    }

    /// Create a model turn carrying plain text.
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![TurnPart::Text { text: text.into() }],
            timestamp: Some(Utc::now()),
        }
    }

    /// Model turn announcing a single tool call.
    pub fn tool_call(call: ToolCall) -> Self {
        Self {
            role: Role::Model,
            parts: vec![TurnPart::ToolCall(call)],
            timestamp: Some(Utc::now()),
        }
    }

    /// User turn answering a single tool call.
    pub fn tool_result(result: ToolResult) -> Self {
        Self {
            role: Role::User,
            parts: vec![TurnPart::ToolResult(result)],
            timestamp: Some(Utc::now()),
        }
    }

    /// Concatenate all text parts (thoughts excluded).
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                TurnPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Tool calls carried by this turn.
    pub fn tool_calls(&self) -> Vec<&ToolCall> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                TurnPart::ToolCall(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    /// Tool results carried by this turn.
    pub fn tool_results(&self) -> Vec<&ToolResult> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                TurnPart::ToolResult(result) => Some(result),
                _ => None,
            })
            .collect()
    }
}

/// Conversation role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// A single part of a turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnPart {
    Text { text: String },
    /// Reasoning trace; informational only, never sent back.
    Thought { text: String },
    ToolCall(ToolCall),
    ToolResult(ToolResult),
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Whether the call targets the reserved UI tool. Says nothing about
    /// whether its arguments are well formed.
    pub fn is_render(&self) -> bool {
        self.name == super::render::RENDER_TOOL_NAME
    }
}

/// Outcome of a tool call. Failures are data: `{"error": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResult {
    pub name: String,
    pub result: serde_json::Value,
}

impl ToolResult {
    pub fn success(name: impl Into<String>, result: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            result,
        }
    }

    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            result: serde_json::json!({ "error": message.into() }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.result
            .as_object()
            .is_some_and(|obj| obj.len() == 1 && obj.get("error").is_some_and(|e| e.is_string()))
    }

    pub fn error_message(&self) -> Option<&str> {
        if !self.is_error() {
            return None;
        }
        self.result.get("error").and_then(|e| e.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tool_result_error_shape() {
        let result = ToolResult::error("getTodoById", "Todo not found");
        assert!(result.is_error());
        assert_eq!(result.error_message(), Some("Todo not found"));
        assert_eq!(result.result, serde_json::json!({"error": "Todo not found"}));

        let ok = ToolResult::success("listTodos", serde_json::json!({"error": "x", "count": 1}));
        assert!(!ok.is_error());
    }

    #[test]
    fn turn_parts_serialize_tagged() {
        let turn = ConversationTurn::tool_call(ToolCall::new(
            "listTodos",
            serde_json::json!({"priority": "urgent"}),
        ));
        let value = serde_json::to_value(&turn.parts[0]).unwrap();
        assert_eq!(value["type"], "tool_call");
        assert_eq!(value["name"], "listTodos");
        assert_eq!(turn.role, Role::Model);
    }

    #[test]
    fn text_skips_thoughts() {
        let turn = ConversationTurn {
            role: Role::Model,
            parts: vec![
                TurnPart::Thought {
                    text: "pondering".into(),
                },
                TurnPart::Text {
                    text: "Done.".into(),
                },
            ],
            timestamp: None,
        };
        assert_eq!(turn.text(), "Done.");
    }
}
