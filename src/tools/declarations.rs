//! Tool declarations advertised to the provider.

use crate::provider::ToolDeclaration;
use crate::types::RENDER_TOOL_NAME;

use super::executor::SiteOperation;
use super::types::ToolParameters;

const STATUSES: &[&str] = &["pending", "in_progress", "completed"];
const PRIORITIES: &[&str] = &["low", "medium", "high", "urgent"];
const STEP_TYPES: &[&str] = &["preview", "confirm", "progress", "result", "error"];
const VARIANTS: &[&str] = &["primary", "danger", "secondary", "success"];

fn declaration(name: &str, description: &str, parameters: ToolParameters) -> ToolDeclaration {
    ToolDeclaration {
        name: name.to_string(),
        description: description.to_string(),
        parameters: parameters.schema,
    }
}

/// Declaration for one site operation.
pub fn site_declaration(operation: SiteOperation) -> ToolDeclaration {
    let name = operation.to_string();
    match operation {
        SiteOperation::CreateTodo => declaration(
            &name,
            "Create a new todo item.",
            ToolParameters::object()
                .string("title", "Short title of the todo", true)
                .string("description", "Longer description", false)
                .string_enum("priority", "Priority of the todo", PRIORITIES, false)
                .string("dueDate", "Due date (ISO 8601)", false)
                .string_array("tags", "Free-form tags", false)
                .build(),
        ),
        SiteOperation::ListTodos => declaration(
            &name,
            "List todos, optionally filtered by status, priority or a search string.",
            ToolParameters::object()
                .string_enum("status", "Only todos with this status", STATUSES, false)
                .string_enum("priority", "Only todos with this priority", PRIORITIES, false)
                .string("search", "Case-insensitive text search", false)
                .build(),
        ),
        SiteOperation::GetTodoById => declaration(
            &name,
            "Fetch a single todo by id.",
            ToolParameters::object().string("id", "Todo id", true).build(),
        ),
        SiteOperation::UpdateTodo => declaration(
            &name,
            "Update fields of an existing todo.",
            ToolParameters::object()
                .string("id", "Todo id", true)
                .string("title", "New title", false)
                .string("description", "New description", false)
                .string_enum("status", "New status", STATUSES, false)
                .string_enum("priority", "New priority", PRIORITIES, false)
                .string("dueDate", "New due date (ISO 8601)", false)
                .string_array("tags", "Replacement tags", false)
                .build(),
        ),
        SiteOperation::DeleteTodo => declaration(
            &name,
            "Delete a todo by id.",
            ToolParameters::object().string("id", "Todo id", true).build(),
        ),
        SiteOperation::BulkUpdateStatus => declaration(
            &name,
            "Set the status of several todos at once.",
            ToolParameters::object()
                .string_array("ids", "Todo ids", true)
                .string_enum("status", "New status", STATUSES, true)
                .build(),
        ),
        SiteOperation::BulkDelete => declaration(
            &name,
            "Delete several todos at once.",
            ToolParameters::object().string_array("ids", "Todo ids", true).build(),
        ),
    }
}

/// Declaration of the reserved UI tool.
pub fn render_declaration() -> ToolDeclaration {
    let action = serde_json::json!({
        "type": "object",
        "properties": {
            "id": { "type": "string" },
            "label": { "type": "string" },
            "variant": { "type": "string", "enum": VARIANTS },
            "continues": {
                "type": "boolean",
                "description": "True when choosing this action should resume the task"
            }
        },
        "required": ["id", "label", "continues"]
    });
    declaration(
        RENDER_TOOL_NAME,
        "Show the user an interactive UI for the current step. Use it to preview \
         changes, ask for confirmation before destructive operations, report \
         progress and present results. Set taskCompleted on the final UI.",
        ToolParameters::object()
            .string(
                "dataStructureDescription",
                "Description of the shape of `data`",
                true,
            )
            .raw(
                "data",
                serde_json::json!({ "description": "Data the UI displays" }),
                true,
            )
            .string("mainGoal", "The user's overall goal", true)
            .string("subGoal", "What this particular UI step achieves", true)
            .string_enum("stepType", "Kind of step", STEP_TYPES, true)
            .raw(
                "actions",
                serde_json::json!({ "type": "array", "items": action }),
                true,
            )
            .raw(
                "metadata",
                serde_json::json!({ "type": "object", "description": "Extra hints for the UI" }),
                false,
            )
            .boolean("taskCompleted", "True when this is the final UI of the task", false)
            .build(),
    )
}

/// Site operations followed by the render tool.
pub fn all_declarations() -> Vec<ToolDeclaration> {
    SiteOperation::all()
        .into_iter()
        .map(site_declaration)
        .chain(std::iter::once(render_declaration()))
        .collect()
}
