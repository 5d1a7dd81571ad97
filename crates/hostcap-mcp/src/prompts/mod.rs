//! Prompt registry: host-supplied prompt templates.

pub mod prompt;
pub mod registry;

pub use prompt::{Prompt, PromptFuture, PromptHandlerFn};
pub use registry::PromptRegistry;
