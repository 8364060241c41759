//! Orchestration engine: the conversation loop, mixed tool-call dispatch,
//! the confirmation gate and cooperative cancellation.

pub mod dispatcher;
pub mod events;
pub mod gate;
pub mod runner;
pub mod session;
pub mod types;

pub use dispatcher::{classify, CallDispatcher, CallKind};
pub use events::{RenderRetryHandler, RenderRetryRequest, RetryDecision, UiEvent, UiEventSink};
pub use gate::{ConfirmationGate, PendingDecision, SubmitOutcome};
pub use runner::{Orchestrator, RunController, RunHandle, DEFAULT_SYSTEM_INSTRUCTION};
pub use session::Session;
pub use types::{DispatchOutcome, LoopState, RunId, RunResult, RunStatus};
