//! genui: generative-UI orchestration engine
//!
//! A language model fulfils a user request by calling todo-site tools and a
//! reserved `render` tool. The engine runs the conversation loop, fans site
//! calls out concurrently, renders UIs one at a time in a sandbox, pauses
//! for human decisions without blocking unrelated work, and can be aborted
//! at any suspension point.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use genui::prelude::*;
//!
//! # async fn example() -> genui::error::Result<()> {
//! let config = GenUiConfig::load()?;
//! let api = Arc::new(HttpTodoApi::new(&config.todo_api_url)?);
//! let executor = Arc::new(SiteToolExecutor::new(api));
//! let orchestrator = Orchestrator::from_config(&config, executor)?;
//!
//! let handle = orchestrator.execute("Delete all completed todos");
//! let result = handle.wait().await;
//! println!("{:?}", result.status);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod orchestration;
pub mod prelude;
pub mod provider;
pub mod render;
pub mod tools;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;
