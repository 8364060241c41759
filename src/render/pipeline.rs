//! Generate, check and execute render code for one `render` call.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::GenUiError;
use crate::provider::{ModelProvider, ProviderClient};
use crate::types::{ConversationTurn, RenderArgs};

use super::prompt::{build_render_prompt, RENDER_SYSTEM_INSTRUCTION};
use super::safety::{strip_code_fences, SafetyPolicy};
use super::sandbox::{ActionBridge, RenderSandbox};

/// Output of a successful render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedUi {
    pub html: String,
    /// Action ids the UI actually wired to a control.
    pub bound_actions: Vec<String>,
}

/// The render sub-pipeline.
///
/// Generation runs on a dedicated client that never persists turns, so
/// unrelated render calls share no context.
pub struct RenderPipeline {
    client: ProviderClient,
    policy: SafetyPolicy,
    sandbox: Arc<dyn RenderSandbox>,
}

impl RenderPipeline {
    pub fn new(provider: Arc<dyn ModelProvider>, sandbox: Arc<dyn RenderSandbox>) -> Self {
        Self {
            client: ProviderClient::new(provider).with_system_instruction(RENDER_SYSTEM_INSTRUCTION),
            policy: SafetyPolicy::new(),
            sandbox,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.client = self.client.with_temperature(temperature);
        self
    }

    /// Ask the render model for code and run it through the safety policy.
    pub async fn generate(&self, args: &RenderArgs) -> Result<String, GenUiError> {
        let prompt = build_render_prompt(args);
        let response = self
            .client
            .send(&[ConversationTurn::user(prompt)], false)
            .await
            .map_err(|err| GenUiError::Generation(err.to_string()))?;

        let raw = response.text.unwrap_or_default();
        let code = strip_code_fences(&raw);
        if code.is_empty() {
            return Err(GenUiError::Generation(
                "render model returned no code".into(),
            ));
        }
        self.policy.check(&code)?;
        debug!(bytes = code.len(), step = %args.step_type, "render code generated");
        Ok(code)
    }

    /// Run checked code in the sandbox.
    pub fn execute(&self, code: &str, args: &RenderArgs) -> Result<RenderedUi, GenUiError> {
        let bridge = ActionBridge::new(args.action_ids());
        let html = self.sandbox.execute(code, &args.data, &bridge)?;
        let bound_actions = bridge.bound();

        let unbound: Vec<&str> = args
            .actions
            .iter()
            .filter(|a| a.continues && !bound_actions.contains(&a.id))
            .map(|a| a.id.as_str())
            .collect();
        if !unbound.is_empty() {
            warn!(?unbound, "rendered UI does not expose every continuing action");
        }

        Ok(RenderedUi {
            html,
            bound_actions,
        })
    }
}
