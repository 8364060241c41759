//! Per-run state shared between the loop and its handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::GenUiError;

use super::gate::ConfirmationGate;
use super::types::{LoopState, RunId};

const DEFAULT_ABORT_REASON: &str = "aborted by user";

/// One orchestration session. Lives exactly as long as its run.
#[derive(Debug)]
pub struct Session {
    run_id: RunId,
    aborted: AtomicBool,
    abort_reason: Mutex<Option<String>>,
    cancel: CancellationToken,
    gate: ConfirmationGate,
    state: watch::Sender<LoopState>,
}

impl Session {
    pub fn new(run_id: RunId) -> Self {
        let (state, _) = watch::channel(LoopState::AwaitingProvider);
        Self {
            run_id,
            aborted: AtomicBool::new(false),
            abort_reason: Mutex::new(None),
            cancel: CancellationToken::new(),
            gate: ConfirmationGate::new(),
            state,
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn gate(&self) -> &ConfirmationGate {
        &self.gate
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Abort the session. Returns `true` only for the call that flipped it.
    pub fn abort(&self, reason: Option<String>) -> bool {
        if self.aborted.swap(true, Ordering::SeqCst) {
            return false;
        }
        let reason = reason.unwrap_or_else(|| DEFAULT_ABORT_REASON.to_string());
        info!(run_id = %self.run_id, %reason, "abort requested");
        *self
            .abort_reason
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(reason.clone());
        self.cancel.cancel();
        self.gate.force_reject(reason);
        true
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    pub fn abort_reason(&self) -> Option<String> {
        self.abort_reason
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Cancellation checkpoint.
    pub fn ensure_active(&self) -> Result<(), GenUiError> {
        if self.is_aborted() {
            return Err(GenUiError::Aborted(
                self.abort_reason()
                    .unwrap_or_else(|| DEFAULT_ABORT_REASON.to_string()),
            ));
        }
        Ok(())
    }

    pub fn state(&self) -> LoopState {
        *self.state.borrow()
    }

    pub fn set_state(&self, next: LoopState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!(run_id = %self.run_id, from = %previous, to = %next, "loop state");
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<LoopState> {
        self.state.subscribe()
    }
}
