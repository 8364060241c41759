//! UI boundary: events pushed to the host and the render retry callback.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::ErrorCategory;
use crate::types::{ActionSpec, StepType, UserAction};

use super::types::RunId;

/// Events emitted to the host while a run progresses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    /// Reasoning trace of the last provider answer. Empty text clears it.
    Thinking { text: String },
    /// Rendered HTML. Empty html clears the surface.
    Ui { html: String },
    /// Final text answer of the model.
    Response { text: String },
    /// The run failed.
    Error {
        message: String,
        category: ErrorCategory,
    },
    /// A decision was received for the UI on display.
    UserAction { action: UserAction },
    /// The UI on display is waiting for one of these actions.
    ActionRequired { actions: Vec<ActionSpec> },
    /// The run finished (completed or errored). Never sent on abort.
    Complete,
}

/// Callback for UI events.
pub type UiEventSink = Arc<dyn Fn(UiEvent) + Send + Sync>;

/// A failed render attempt offered to the host for one retry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderRetryRequest {
    pub error: String,
    pub category: ErrorCategory,
    pub main_goal: String,
    pub step_type: StepType,
}

/// The host's answer to a [`RenderRetryRequest`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RetryDecision {
    Retry,
    Decline,
}

/// Async render retry handler.
pub type RenderRetryHandler =
    Arc<dyn Fn(RenderRetryRequest) -> BoxFuture<'static, RetryDecision> + Send + Sync>;

/// Fans events out to the optional sink, tagged with the run for tracing.
#[derive(Clone)]
pub(crate) struct UiEmitter {
    run_id: RunId,
    sink: Option<UiEventSink>,
}

impl UiEmitter {
    pub(crate) fn new(run_id: RunId, sink: Option<UiEventSink>) -> Self {
        Self { run_id, sink }
    }

    pub(crate) fn emit(&self, event: UiEvent) {
        let Some(sink) = &self.sink else {
            return;
        };
        trace!(run_id = %self.run_id, ?event, "ui event");
        (sink)(event);
    }

    pub(crate) fn thinking(&self, text: impl Into<String>) {
        self.emit(UiEvent::Thinking { text: text.into() });
    }

    pub(crate) fn ui(&self, html: impl Into<String>) {
        self.emit(UiEvent::Ui { html: html.into() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn events_serialize_with_type_tag() {
        let value = serde_json::to_value(UiEvent::Ui {
            html: "<p>hi</p>".into(),
        })
        .unwrap();
        assert_eq!(value, serde_json::json!({"type": "ui", "html": "<p>hi</p>"}));

        let value = serde_json::to_value(UiEvent::Error {
            message: "x".into(),
            category: ErrorCategory::Render,
        })
        .unwrap();
        assert_eq!(value["category"], "render");
    }

    #[test]
    fn emitter_without_sink_is_silent() {
        UiEmitter::new(RunId::new_v4(), None).ui("ignored");
    }

    #[test]
    fn emitter_forwards_to_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let sink: UiEventSink = Arc::new(move |event: UiEvent| sink_seen.lock().unwrap().push(event));
        let emitter = UiEmitter::new(RunId::new_v4(), Some(sink));
        emitter.thinking("hmm");
        emitter.emit(UiEvent::Complete);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![UiEvent::Thinking { text: "hmm".into() }, UiEvent::Complete]
        );
    }
}
