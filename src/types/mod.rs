//! Core types shared by the provider, executor, render and orchestration layers.

pub mod action;
pub mod message;
pub mod render;

pub use action::*;
pub use message::*;
pub use render::*;
