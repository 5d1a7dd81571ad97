//! Prompt: summarize. Asks the model for a short summary of some text.

use serde_json::Value;

use crate::context::RequestContext;
use crate::types::{
    McpError, McpResult, PromptArgument, PromptDefinition, PromptGetResult, PromptMessage,
};

pub fn definition() -> PromptDefinition {
    PromptDefinition {
        name: "summarize".to_string(),
        description: Some("Summarize a piece of text".to_string()),
        arguments: Some(vec![
            PromptArgument {
                name: "text".to_string(),
                description: Some("The text to summarize".to_string()),
                required: true,
            },
            PromptArgument {
                name: "max_words".to_string(),
                description: Some("Upper bound on summary length".to_string()),
                required: false,
            },
        ]),
    }
}

pub async fn expand(args: Value, _ctx: RequestContext) -> McpResult<PromptGetResult> {
    let text = args
        .get("text")
        .and_then(|v| v.as_str())
        .ok_or_else(|| McpError::InvalidParams("text must be a string".to_string()))?;

    let limit = match args.get("max_words") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    let limit_clause = limit
        .map(|n| format!(" in at most {n} words"))
        .unwrap_or_default();

    Ok(PromptGetResult {
        description: Some("Summarize a piece of text".to_string()),
        messages: vec![PromptMessage::user(format!(
            "Summarize the following text{limit_clause}:\n\n{text}"
        ))],
    })
}
