//! Render sub-pipeline: turns `render` call arguments into interactive HTML.

pub mod pipeline;
pub mod prompt;
pub mod safety;
pub mod sandbox;

pub use pipeline::{RenderPipeline, RenderedUi};
pub use prompt::{build_render_prompt, RENDER_SYSTEM_INSTRUCTION};
pub use safety::{strip_code_fences, SafetyPolicy};
pub use sandbox::{ActionBridge, RenderSandbox, TemplateSandbox, ACTION_ATTRIBUTE, PAYLOAD_ATTRIBUTE};
