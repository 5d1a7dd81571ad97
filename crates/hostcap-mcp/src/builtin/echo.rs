//! Tool: echo. Returns the message it was given.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::context::RequestContext;
use crate::types::{LogLevel, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct EchoParams {
    message: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "echo".to_string(),
        description: Some("Return the given message unchanged".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "message": { "type": "string", "description": "Text to echo back" }
            },
            "required": ["message"]
        }),
    }
}

pub async fn execute(args: Value, ctx: RequestContext) -> anyhow::Result<ToolCallResult> {
    let params: EchoParams = serde_json::from_value(args)?;
    ctx.log_as(LogLevel::Debug, "echo", json!({ "length": params.message.len() }));
    Ok(ToolCallResult::text(params.message))
}
