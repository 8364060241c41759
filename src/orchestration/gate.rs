//! Single-slot rendezvous between a suspended render and the user.

use std::sync::Mutex;

use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::error::GenUiError;
use crate::types::UserAction;

type Decision = Result<UserAction, String>;

/// Whether a submitted action reached a waiting render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Delivered,
    NoPendingAction,
}

/// A registered wait for the user's decision.
#[derive(Debug)]
pub struct PendingDecision {
    rx: oneshot::Receiver<Decision>,
}

impl PendingDecision {
    /// Resolve with the submitted action, or `Aborted` if the gate was
    /// force-rejected or dropped.
    pub async fn wait(self) -> Result<UserAction, GenUiError> {
        match self.rx.await {
            Ok(Ok(action)) => Ok(action),
            Ok(Err(reason)) => Err(GenUiError::Aborted(reason)),
            Err(_) => Err(GenUiError::Aborted("confirmation gate closed".into())),
        }
    }
}

/// Holds at most one outstanding decision.
#[derive(Debug, Default)]
pub struct ConfirmationGate {
    slot: Mutex<Option<oneshot::Sender<Decision>>>,
}

impl ConfirmationGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<oneshot::Sender<Decision>>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a wait. Fails if another decision is still outstanding.
    pub fn await_decision(&self) -> Result<PendingDecision, GenUiError> {
        let mut slot = self.lock();
        if slot.as_ref().is_some_and(|tx| !tx.is_closed()) {
            error!("confirmation gate already has a pending action");
            return Err(GenUiError::InvalidState(
                "a user action is already pending".into(),
            ));
        }
        let (tx, rx) = oneshot::channel();
        *slot = Some(tx);
        Ok(PendingDecision { rx })
    }

    /// Deliver `action` to the waiting render, if any.
    pub fn submit(&self, action: UserAction) -> SubmitOutcome {
        let Some(tx) = self.lock().take() else {
            debug!(action_id = %action.action_id, "no pending action, submission ignored");
            return SubmitOutcome::NoPendingAction;
        };
        let action_id = action.action_id.clone();
        match tx.send(Ok(action)) {
            Ok(()) => {
                debug!(%action_id, "user action delivered");
                SubmitOutcome::Delivered
            }
            Err(_) => {
                debug!(%action_id, "pending action was abandoned, submission ignored");
                SubmitOutcome::NoPendingAction
            }
        }
    }

    /// Reject the outstanding decision, if any, and clear the slot.
    pub fn force_reject(&self, reason: impl Into<String>) -> bool {
        match self.lock().take() {
            Some(tx) => tx.send(Err(reason.into())).is_ok(),
            None => false,
        }
    }

    /// Drop the outstanding registration without resolving it.
    pub fn clear(&self) {
        self.lock().take();
    }

    pub fn is_pending(&self) -> bool {
        self.lock().as_ref().is_some_and(|tx| !tx.is_closed())
    }
}
