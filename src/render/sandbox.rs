//! Capability-limited execution of generated render code.

use std::sync::{Arc, Mutex};

use minijinja::value::Value;
use minijinja::{AutoEscape, Environment, Error, ErrorKind, HtmlEscape, UndefinedBehavior};
use tracing::debug;

use crate::error::GenUiError;

/// HTML attribute written by `on_action` onto the control it decorates.
pub const ACTION_ATTRIBUTE: &str = "data-genui-action";
/// HTML attribute carrying the JSON payload of an action, when given.
pub const PAYLOAD_ATTRIBUTE: &str = "data-genui-payload";

const DEFAULT_FUEL: u64 = 50_000;

/// Connects controls in the rendered UI to the confirmation gate.
///
/// Only the offered action ids may be bound; every successful binding is
/// recorded so the pipeline can tell which actions are reachable.
#[derive(Debug, Clone)]
pub struct ActionBridge {
    allowed: Arc<Vec<String>>,
    bound: Arc<Mutex<Vec<String>>>,
}

impl ActionBridge {
    pub fn new(allowed: Vec<String>) -> Self {
        Self {
            allowed: Arc::new(allowed),
            bound: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn is_allowed(&self, action_id: &str) -> bool {
        self.allowed.iter().any(|id| id == action_id)
    }

    /// Action ids bound so far, deduplicated, in first-bound order.
    pub fn bound(&self) -> Vec<String> {
        self.bound
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn bind(&self, action_id: &str, payload: Option<String>) -> Result<String, String> {
        if !self.is_allowed(action_id) {
            return Err(format!("unknown action id '{action_id}'"));
        }
        {
            let mut bound = self
                .bound
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if !bound.iter().any(|id| id == action_id) {
                bound.push(action_id.to_string());
            }
        }
        let mut markup = format!(r#"{ACTION_ATTRIBUTE}="{}""#, escape_attribute(action_id));
        if let Some(payload) = payload {
            markup.push_str(&format!(
                r#" {PAYLOAD_ATTRIBUTE}="{}""#,
                escape_attribute(&payload)
            ));
        }
        Ok(markup)
    }
}

/// Executes generated render code against data.
pub trait RenderSandbox: Send + Sync {
    /// Run `code` and return the HTML produced by its render entry point.
    fn execute(
        &self,
        code: &str,
        data: &serde_json::Value,
        bridge: &ActionBridge,
    ) -> Result<String, GenUiError>;
}

/// [`RenderSandbox`] backed by a MiniJinja interpreter.
///
/// The environment has no loader, no globals and a fuel budget, so a
/// template can only read `data`, call `on_action` and emit markup.
#[derive(Debug, Clone)]
pub struct TemplateSandbox {
    fuel: u64,
}

impl Default for TemplateSandbox {
    fn default() -> Self {
        Self { fuel: DEFAULT_FUEL }
    }
}

impl TemplateSandbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fuel(mut self, fuel: u64) -> Self {
        self.fuel = fuel;
        self
    }

    fn environment<'source>(&self) -> Environment<'source> {
        let mut env = Environment::empty();
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.set_fuel(Some(self.fuel));
        env.add_filter("length", minijinja::filters::length);
        env.add_filter("upper", minijinja::filters::upper);
        env.add_filter("lower", minijinja::filters::lower);
        env.add_filter("title", minijinja::filters::title);
        env.add_filter("capitalize", minijinja::filters::capitalize);
        env.add_filter("default", minijinja::filters::default);
        env.add_filter("join", minijinja::filters::join);
        env.add_filter("first", minijinja::filters::first);
        env.add_filter("last", minijinja::filters::last);
        env.add_filter("trim", minijinja::filters::trim);
        env.add_filter("replace", minijinja::filters::replace);
        env.add_filter("round", minijinja::filters::round);
        env.add_filter("reverse", minijinja::filters::reverse);
        env.add_filter("items", minijinja::filters::items);
        env.add_filter("dictsort", minijinja::filters::dictsort);
        env.add_filter("escape", minijinja::filters::escape);
        env.add_filter("e", minijinja::filters::escape);
        env.add_test("defined", minijinja::tests::is_defined);
        env.add_test("undefined", minijinja::tests::is_undefined);
        env.add_test("none", minijinja::tests::is_none);
        env
    }
}

impl RenderSandbox for TemplateSandbox {
    fn execute(
        &self,
        code: &str,
        data: &serde_json::Value,
        bridge: &ActionBridge,
    ) -> Result<String, GenUiError> {
        let env = self.environment();
        let template = env.template_from_str(code).map_err(sandbox_error)?;
        let captured = template.render_captured(()).map_err(sandbox_error)?;

        let hook = bridge.clone();
        let on_action = Value::from_function(
            move |action_id: String, payload: Option<Value>| -> Result<Value, Error> {
                let payload = match payload {
                    Some(value) if !value.is_none() && !value.is_undefined() => {
                        Some(serde_json::to_string(&value).map_err(|e| {
                            Error::new(ErrorKind::InvalidOperation, e.to_string())
                        })?)
                    }
                    _ => None,
                };
                hook.bind(&action_id, payload)
                    .map(Value::from_safe_string)
                    .map_err(|msg| Error::new(ErrorKind::InvalidOperation, msg))
            },
        );

        let html = captured
            .state()
            .call_macro("render", &[Value::from_serialize(data), on_action])
            .map_err(sandbox_error)?;
        debug!(bytes = html.len(), bound = ?bridge.bound(), "render executed");
        Ok(html.trim().to_string())
    }
}

fn sandbox_error(err: Error) -> GenUiError {
    GenUiError::Sandbox(err.to_string())
}

fn escape_attribute(raw: &str) -> String {
    HtmlEscape(raw).to_string()
}
