//! Prompt registration record.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::context::{BoxFuture, RequestContext};
use crate::types::{McpResult, PromptDefinition, PromptGetResult};

pub type PromptFuture = BoxFuture<'static, McpResult<PromptGetResult>>;

pub type PromptHandlerFn = Arc<dyn Fn(Value, RequestContext) -> PromptFuture + Send + Sync>;

/// A prompt's public definition paired with the handler that expands it.
#[derive(Clone)]
pub struct Prompt {
    definition: PromptDefinition,
    handler: PromptHandlerFn,
}

impl Prompt {
    pub fn new<F, Fut>(definition: PromptDefinition, handler: F) -> Self
    where
        F: Fn(Value, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = McpResult<PromptGetResult>> + Send + 'static,
    {
        Self {
            definition,
            handler: Arc::new(move |args: Value, ctx: RequestContext| -> PromptFuture {
                Box::pin(handler(args, ctx))
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &PromptDefinition {
        &self.definition
    }

    /// Names of the arguments the prompt declares as required.
    pub fn required_arguments(&self) -> impl Iterator<Item = &str> {
        self.definition
            .arguments
            .iter()
            .flatten()
            .filter(|a| a.required)
            .map(|a| a.name.as_str())
    }

    pub fn get(&self, arguments: Value, ctx: RequestContext) -> PromptFuture {
        (self.handler)(arguments, ctx)
    }
}

impl std::fmt::Debug for Prompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prompt")
            .field("name", &self.definition.name)
            .finish_non_exhaustive()
    }
}
