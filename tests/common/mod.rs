//! Shared test helpers: scripted providers, a mock site and an event recorder.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::json;

use genui::error::GenUiError;
use genui::orchestration::{
    LoopState, Orchestrator, RenderRetryHandler, RenderRetryRequest, RetryDecision, UiEvent,
    UiEventSink,
};
use genui::provider::{ModelProvider, ProviderRequest, ProviderResponse};
use genui::tools::ToolExecutor;
use genui::types::{ToolCall, ToolResult};

/// Template that renders every top-level field of `data`.
pub const GENERIC_TEMPLATE: &str = r#"{% macro render(data, on_action) %}
<section>{% for key, value in data|items %}<p>{{ key }}: {{ value }}</p>{% endfor %}</section>
{% endmacro %}"#;

/// One scripted provider reply.
pub enum Step {
    Respond(ProviderResponse),
    Fail(GenUiError),
    /// Never resolves; only cancellation ends the request.
    Hang,
}

/// A provider that replays queued steps and records every request.
pub struct ScriptedProvider {
    name: String,
    steps: Mutex<VecDeque<Step>>,
    fallback: ProviderResponse,
    delay: Option<Duration>,
    requests: Mutex<Vec<ProviderRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            steps: Mutex::new(VecDeque::new()),
            fallback: ProviderResponse::text("done"),
            delay: None,
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Render provider answering every request with [`GENERIC_TEMPLATE`].
    pub fn render() -> Self {
        Self::new("render").with_fallback(ProviderResponse::text(GENERIC_TEMPLATE))
    }

    pub fn with_fallback(mut self, fallback: ProviderResponse) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push(&self, step: Step) -> &Self {
        self.steps.lock().unwrap().push_back(step);
        self
    }

    pub fn respond(&self, response: ProviderResponse) -> &Self {
        self.push(Step::Respond(response))
    }

    pub fn calls(&self, calls: Vec<ToolCall>) -> &Self {
        self.respond(ProviderResponse::tool_calls(calls))
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        &self.name
    }

    fn model_id(&self) -> &str {
        "scripted-1"
    }

    async fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse, GenUiError> {
        self.requests.lock().unwrap().push(request.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let step = self.steps.lock().unwrap().pop_front();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match step {
            Some(Step::Respond(response)) => Ok(response),
            Some(Step::Fail(err)) => Err(err),
            Some(Step::Hang) => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            None => Ok(self.fallback.clone()),
        }
    }
}

/// A tool executor with per-call delays that logs start and end of calls.
#[derive(Default)]
pub struct MockExecutor {
    delays: Mutex<Vec<(String, Duration)>>,
    log: Mutex<Vec<String>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay calls whose arguments contain `needle` in their JSON text.
    pub fn delay_matching(self, needle: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().push((needle.to_string(), delay));
        self
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn executed(&self) -> usize {
        self.log().iter().filter(|e| e.starts_with("end:")).count()
    }
}

#[async_trait]
impl ToolExecutor for MockExecutor {
    async fn execute(&self, call: &ToolCall) -> ToolResult {
        let args = call.arguments.to_string();
        let label = format!("{}{}", call.name, args);
        self.log.lock().unwrap().push(format!("start:{label}"));

        let delay = self
            .delays
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| args.contains(needle.as_str()))
            .map(|(_, d)| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.log.lock().unwrap().push(format!("end:{label}"));
        ToolResult::success(&call.name, json!({ "tool": call.name, "args": call.arguments }))
    }
}

/// Collects every event emitted by a run.
#[derive(Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<UiEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(&self) -> UiEventSink {
        let events = self.events.clone();
        Arc::new(move |event: UiEvent| events.lock().unwrap().push(event))
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&UiEvent) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }

    pub fn completes(&self) -> usize {
        self.count(|e| matches!(e, UiEvent::Complete))
    }

    pub fn errors(&self) -> usize {
        self.count(|e| matches!(e, UiEvent::Error { .. }))
    }

    pub fn uis(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Ui { html } => Some(html),
                _ => None,
            })
            .collect()
    }
}

/// Retry handler returning a fixed decision and counting invocations.
pub fn fixed_retry(decision: RetryDecision, asked: Arc<AtomicUsize>) -> RenderRetryHandler {
    Arc::new(move |_request: RenderRetryRequest| {
        asked.fetch_add(1, Ordering::SeqCst);
        async move { decision }.boxed()
    })
}

/// Wire an orchestrator around scripted providers and a recorder.
pub fn orchestrator(
    provider: Arc<ScriptedProvider>,
    render: Arc<ScriptedProvider>,
    executor: Arc<dyn ToolExecutor>,
    recorder: &EventRecorder,
) -> Orchestrator {
    Orchestrator::new(provider, render, executor).with_event_sink(recorder.sink())
}

pub fn render_call(args: serde_json::Value) -> ToolCall {
    ToolCall::new("render", args)
}

/// Valid render arguments with the given actions and completion flag.
pub fn render_args(
    step_type: &str,
    actions: serde_json::Value,
    task_completed: Option<bool>,
) -> serde_json::Value {
    let mut args = json!({
        "dataStructureDescription": "todos",
        "data": {"count": 2},
        "mainGoal": "Tidy the todo list",
        "subGoal": format!("{step_type} step"),
        "stepType": step_type,
        "actions": actions,
    });
    if let Some(done) = task_completed {
        args["taskCompleted"] = json!(done);
    }
    args
}

pub fn confirm_actions() -> serde_json::Value {
    json!([
        {"id": "confirm", "label": "Confirm", "variant": "danger", "continues": true},
        {"id": "cancel", "label": "Cancel", "continues": false}
    ])
}

pub fn display_actions() -> serde_json::Value {
    json!([{"id": "ok", "label": "OK", "continues": false}])
}

/// Wait for `target`, failing the test after two seconds.
pub async fn reach(handle: &genui::orchestration::RunHandle, target: LoopState) -> LoopState {
    tokio::time::timeout(Duration::from_secs(2), handle.wait_for_state(target))
        .await
        .expect("state not reached in time")
}
