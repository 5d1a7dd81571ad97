//! Tool registry: host-supplied invocable tools.

pub mod registry;
pub mod tool;

pub use registry::ToolRegistry;
pub use tool::{Tool, ToolFuture, ToolHandlerFn};
