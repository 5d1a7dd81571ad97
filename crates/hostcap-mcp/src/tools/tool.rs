//! Tool registration record.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::context::{BoxFuture, RequestContext};
use crate::types::{ToolCallResult, ToolDefinition};

/// Future returned by a tool handler. Any error is reported to the peer as an
/// `isError` result, not as a protocol error.
pub type ToolFuture = BoxFuture<'static, anyhow::Result<ToolCallResult>>;

pub type ToolHandlerFn = Arc<dyn Fn(Value, RequestContext) -> ToolFuture + Send + Sync>;

/// A tool's public definition paired with its handler.
#[derive(Clone)]
pub struct Tool {
    definition: ToolDefinition,
    handler: ToolHandlerFn,
}

impl Tool {
    pub fn new<F, Fut>(definition: ToolDefinition, handler: F) -> Self
    where
        F: Fn(Value, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<ToolCallResult>> + Send + 'static,
    {
        Self {
            definition,
            handler: Arc::new(move |args: Value, ctx: RequestContext| -> ToolFuture {
                Box::pin(handler(args, ctx))
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    pub fn call(&self, arguments: Value, ctx: RequestContext) -> ToolFuture {
        (self.handler)(arguments, ctx)
    }
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.definition.name)
            .finish_non_exhaustive()
    }
}
