//! Arguments of the reserved `render` tool.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Name of the reserved UI-generation tool.
pub const RENDER_TOOL_NAME: &str = "render";

/// Where in the user's task a rendered UI sits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StepType {
    Preview,
    Confirm,
    Progress,
    Result,
    Error,
}

/// Visual emphasis of an action control.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ActionVariant {
    Primary,
    Danger,
    Secondary,
    Success,
}

/// An action the rendered UI offers to the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionSpec {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<ActionVariant>,
    /// When true, choosing this action resumes the orchestration, so the
    /// render call must wait for a decision.
    pub continues: bool,
}

/// Validated arguments of a `render` call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderArgs {
    pub data_structure_description: String,
    pub data: serde_json::Value,
    pub main_goal: String,
    pub sub_goal: String,
    pub step_type: StepType,
    pub actions: Vec<ActionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_completed: Option<bool>,
}

impl RenderArgs {
    /// Validate raw call arguments against the render shape.
    pub fn from_arguments(arguments: &serde_json::Value) -> Result<Self, String> {
        if !arguments.is_object() {
            return Err("arguments must be an object".to_string());
        }
        serde_json::from_value(arguments.clone()).map_err(|e| e.to_string())
    }

    /// Terminal UI for the session.
    pub fn is_terminal(&self) -> bool {
        self.task_completed == Some(true)
    }

    /// A render waits for a human decision iff one of its actions continues
    /// the flow and it is not the terminal UI.
    pub fn requires_confirmation(&self) -> bool {
        !self.is_terminal() && self.actions.iter().any(|a| a.continues)
    }

    pub fn action_ids(&self) -> Vec<String> {
        self.actions.iter().map(|a| a.id.clone()).collect()
    }
}
