//! Stateful conversation client on top of a [`ModelProvider`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::GenUiError;
use crate::types::ConversationTurn;

use super::{ModelProvider, ProviderRequest, ProviderResponse, ToolDeclaration};

/// Conversation client that accumulates history across `send` calls.
///
/// A client is not reentrant: issuing a second `send` while one is in
/// flight fails with [`GenUiError::InvalidState`].
pub struct ProviderClient {
    provider: Arc<dyn ModelProvider>,
    system_instruction: Option<String>,
    tool_declarations: Option<Vec<ToolDeclaration>>,
    temperature: Option<f64>,
    include_thoughts: bool,
    history: Mutex<Vec<ConversationTurn>>,
    in_flight: AtomicBool,
}

impl ProviderClient {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            provider,
            system_instruction: None,
            tool_declarations: None,
            temperature: None,
            include_thoughts: false,
            history: Mutex::new(Vec::new()),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_tool_declarations(mut self, declarations: Vec<ToolDeclaration>) -> Self {
        self.tool_declarations = (!declarations.is_empty()).then_some(declarations);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_thoughts(mut self, include: bool) -> Self {
        self.include_thoughts = include;
        self
    }

    pub fn provider(&self) -> &Arc<dyn ModelProvider> {
        &self.provider
    }

    /// Snapshot of the persisted conversation.
    pub fn history(&self) -> Vec<ConversationTurn> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Send `turns` after the persisted history.
    ///
    /// With `persist = true` the turns are appended to history once the
    /// provider answers; a final answer (no tool calls) is appended as a
    /// model turn too. Tool-call turns are left to the caller, which appends
    /// them paired with their results.
    pub async fn send(
        &self,
        turns: &[ConversationTurn],
        persist: bool,
    ) -> Result<ProviderResponse, GenUiError> {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;

        let mut conversation = self.history();
        conversation.extend_from_slice(turns);

        let request = ProviderRequest {
            conversation,
            tool_declarations: self.tool_declarations.clone(),
            temperature: self.temperature,
            system_instruction: self.system_instruction.clone(),
            include_thoughts: self.include_thoughts,
        };

        debug!(
            provider = self.provider.provider_name(),
            model = self.provider.model_id(),
            new_turns = turns.len(),
            persist,
            "provider send"
        );

        let response = self.provider.generate(&request).await?;

        if persist {
            let mut history = self
                .history
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            history.extend_from_slice(turns);
            if response.tool_calls.is_empty() {
                if let Some(text) = response.text.as_deref().filter(|t| !t.is_empty()) {
                    history.push(ConversationTurn::model(text));
                }
            }
        }

        Ok(response)
    }
}

/// Clears the in-flight flag even when the `send` future is dropped early.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, GenUiError> {
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(GenUiError::InvalidState(
                "provider client already has a request in flight".into(),
            ));
        }
        Ok(Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Role, ToolCall};
    use async_trait::async_trait;
    use tokio::sync::Notify;

    struct EchoProvider {
        requests: Mutex<Vec<ProviderRequest>>,
        response: ProviderResponse,
        gate: Option<Arc<Notify>>,
    }

    impl EchoProvider {
        fn new(response: ProviderResponse) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                response,
                gate: None,
            }
        }
    }

    #[async_trait]
    impl ModelProvider for EchoProvider {
        fn provider_name(&self) -> &str {
            "echo"
        }

        fn model_id(&self) -> &str {
            "echo-1"
        }

        async fn generate(
            &self,
            request: &ProviderRequest,
        ) -> Result<ProviderResponse, GenUiError> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            Ok(self.response.clone())
        }
    }

    #[tokio::test]
    async fn persisted_turns_accumulate_with_final_answer() {
        let provider = Arc::new(EchoProvider::new(ProviderResponse::text("Hi there")));
        let client = ProviderClient::new(provider.clone()).with_temperature(0.3);

        client.send(&[ConversationTurn::user("Hello")], true).await.unwrap();
        client.send(&[ConversationTurn::user("Again")], true).await.unwrap();

        let history = client.history();
        assert_eq!(history.len(), 4);
        assert_eq!(history[1].role, Role::Model);
        assert_eq!(history[1].text(), "Hi there");

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[1].conversation.len(), 3);
        assert_eq!(requests[1].temperature, Some(0.3));
    }

    #[tokio::test]
    async fn non_persisted_send_leaves_history_untouched() {
        let provider = Arc::new(EchoProvider::new(ProviderResponse::text("<div/>")));
        let client = ProviderClient::new(provider.clone());

        client.send(&[ConversationTurn::user("first")], false).await.unwrap();
        client.send(&[ConversationTurn::user("second")], false).await.unwrap();

        assert!(client.history().is_empty());
        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[1].conversation.len(), 1);
        assert_eq!(requests[1].conversation[0].text(), "second");
    }

    #[tokio::test]
    async fn tool_call_responses_are_not_persisted_as_model_turns() {
        let provider = Arc::new(EchoProvider::new(ProviderResponse::tool_calls(vec![
            ToolCall::new("listTodos", serde_json::json!({})),
        ])));
        let client = ProviderClient::new(provider);
        client.send(&[ConversationTurn::user("list")], true).await.unwrap();
        assert_eq!(client.history().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_send_is_rejected() {
        let gate = Arc::new(Notify::new());
        let mut provider = EchoProvider::new(ProviderResponse::text("ok"));
        provider.gate = Some(gate.clone());
        let client = Arc::new(ProviderClient::new(Arc::new(provider)));

        let first = {
            let client = client.clone();
            tokio::spawn(async move { client.send(&[ConversationTurn::user("a")], true).await })
        };
        tokio::task::yield_now().await;
        while !client.in_flight.load(Ordering::Acquire) {
            tokio::task::yield_now().await;
        }

        let err = client
            .send(&[ConversationTurn::user("b")], true)
            .await
            .unwrap_err();
        assert!(matches!(err, GenUiError::InvalidState(_)));

        gate.notify_one();
        first.await.unwrap().unwrap();
        assert!(!client.in_flight.load(Ordering::Acquire));
    }
}
