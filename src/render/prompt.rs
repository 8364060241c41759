//! Prompt construction for the render model.

use crate::types::RenderArgs;

/// System instruction of the dedicated render client.
pub const RENDER_SYSTEM_INSTRUCTION: &str = "You are a UI code generator. \
You write a single MiniJinja template that renders an HTML fragment for one \
step of a task.

Rules:
- Define exactly one entry point: {% macro render(data, on_action) %} ... {% endmacro %}
- `data` holds the values to display. Do not invent data.
- Attach every action to a control with {{ on_action(\"<action id>\") }} inside \
the element's attributes, e.g. <button {{ on_action(\"confirm\") }}>Delete</button>. \
An optional second argument carries a payload object.
- Only use the action ids you are given.
- No <script>, no inline event handlers, no iframes, no javascript: URLs.
- No {% import %}, {% include %}, {% extends %} or {% from %}.
- Reply with the template only.";

/// Build the user prompt for one render call.
///
/// The output is a pure function of `args`.
pub fn build_render_prompt(args: &RenderArgs) -> String {
    let data = serde_json::to_string_pretty(&args.data).unwrap_or_else(|_| args.data.to_string());
    let actions = serde_json::to_string_pretty(&args.actions).unwrap_or_default();

    let mut prompt = String::with_capacity(data.len() + actions.len() + 512);
    prompt.push_str(&format!("Main goal: {}\n", args.main_goal));
    prompt.push_str(&format!("Current step: {}\n", args.sub_goal));
    prompt.push_str(&format!("Step type: {}\n", args.step_type));
    if args.is_terminal() {
        prompt.push_str("This is the final UI of the task.\n");
    }
    prompt.push_str(&format!(
        "\nData structure:\n{}\n",
        args.data_structure_description
    ));
    prompt.push_str(&format!("\nData:\n{data}\n"));
    prompt.push_str(&format!("\nActions:\n{actions}\n"));
    if let Some(metadata) = &args.metadata {
        let metadata = serde_json::to_string_pretty(metadata).unwrap_or_default();
        prompt.push_str(&format!("\nMetadata:\n{metadata}\n"));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args() -> RenderArgs {
        RenderArgs::from_arguments(&json!({
            "dataStructureDescription": "array of todos with id and title",
            "data": [{"id": "7", "title": "Water plants"}],
            "mainGoal": "Clean up old todos",
            "subGoal": "Confirm deletion of one todo",
            "stepType": "confirm",
            "actions": [{"id": "confirm", "label": "Delete", "continues": true}],
            "metadata": {"density": "compact"}
        }))
        .unwrap()
    }

    #[test]
    fn prompt_contains_every_field() {
        let prompt = build_render_prompt(&args());
        for needle in [
            "Clean up old todos",
            "Confirm deletion of one todo",
            "Step type: confirm",
            "array of todos with id and title",
            "Water plants",
            "\"confirm\"",
            "compact",
        ] {
            assert!(prompt.contains(needle), "missing {needle}");
        }
        assert!(!prompt.contains("final UI"));
    }

    #[test]
    fn prompt_is_deterministic() {
        assert_eq!(build_render_prompt(&args()), build_render_prompt(&args()));
    }
}
