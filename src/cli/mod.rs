//! Terminal host for genui runs.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::orchestration::UiEvent;
use crate::types::{ActionSpec, UserAction};

/// genui CLI
#[derive(Parser, Debug)]
#[command(name = "genui", version, about = "genui: generative-UI todo assistant")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one request through the orchestrator
    Run(RunArgs),
    /// Print the tool declarations sent to the model as JSON
    Tools,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// What you want done, in plain language
    pub prompt: String,

    /// Model driving the conversation
    #[arg(short, long)]
    pub model: Option<String>,

    /// Model generating render code
    #[arg(long)]
    pub render_model: Option<String>,

    /// Base URL of the todo API
    #[arg(long)]
    pub todo_api_url: Option<String>,

    /// Config file to read instead of the default location
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write every rendered UI into this directory as step-N.html
    #[arg(long)]
    pub html_dir: Option<PathBuf>,
}

/// Install the stderr tracing subscriber. `GENUI_LOG` wins over `RUST_LOG`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = std::env::var("GENUI_LOG")
        .ok()
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("genui=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// One-line terminal rendering of an event, or `None` for silent events.
pub fn describe_event(event: &UiEvent) -> Option<String> {
    match event {
        UiEvent::Thinking { text } if !text.is_empty() => Some(format!("… {}", text.trim())),
        UiEvent::Ui { html } if !html.is_empty() => {
            Some(format!("[ui] {} bytes of HTML rendered", html.len()))
        }
        UiEvent::Response { text } => Some(text.clone()),
        UiEvent::Error { message, category } => {
            Some(format!("error ({}): {message}", category_label(*category)))
        }
        UiEvent::UserAction { action } => Some(format!("> {}", action.action_id)),
        UiEvent::ActionRequired { actions } => {
            let mut lines = vec!["Choose an action:".to_string()];
            for (i, action) in actions.iter().enumerate() {
                lines.push(format!("  [{}] {} ({})", i + 1, action.label, action.id));
            }
            Some(lines.join("\n"))
        }
        _ => None,
    }
}

fn category_label(category: crate::error::ErrorCategory) -> String {
    serde_json::to_value(category)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{category:?}"))
}

/// Map terminal input to one of the offered actions: a 1-based index or an
/// action id.
pub fn parse_action_choice(input: &str, actions: &[ActionSpec]) -> Option<UserAction> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(index) = input.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|i| actions.get(i))
            .map(|a| UserAction::new(a.id.clone()));
    }
    actions
        .iter()
        .find(|a| a.id == input)
        .map(|a| UserAction::new(a.id.clone()))
}

/// Whether a y/N answer accepts.
pub fn is_affirmative(input: &str) -> bool {
    matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
