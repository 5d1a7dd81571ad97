//! Tool: countdown. Sleeps through a number of steps, reporting progress
//! after each one and stopping early when cancelled.

use std::time::Duration;

use anyhow::bail;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::context::RequestContext;
use crate::types::{LogLevel, ToolCallResult, ToolDefinition};

const MAX_STEPS: u64 = 1_000;
const DEFAULT_INTERVAL_MS: u64 = 100;

#[derive(Debug, Deserialize)]
struct CountdownParams {
    steps: u64,
    #[serde(default)]
    interval_ms: Option<u64>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "countdown".to_string(),
        description: Some(
            "Count down from `steps`, emitting a progress notification per step".to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "steps": { "type": "integer", "description": "Number of steps (max 1000)" },
                "interval_ms": { "type": "integer", "description": "Delay per step (default 100)" }
            },
            "required": ["steps"]
        }),
    }
}

pub async fn execute(args: Value, ctx: RequestContext) -> anyhow::Result<ToolCallResult> {
    let params: CountdownParams = serde_json::from_value(args)?;
    if params.steps > MAX_STEPS {
        bail!("steps must be at most {MAX_STEPS}, got {}", params.steps);
    }
    let interval = Duration::from_millis(params.interval_ms.unwrap_or(DEFAULT_INTERVAL_MS));
    let total = params.steps as f64;

    for step in 1..=params.steps {
        tokio::select! {
            _ = ctx.cancelled() => {
                ctx.log(LogLevel::Info, json!({ "countdown": "cancelled", "step": step }));
                bail!("countdown cancelled at step {step}");
            }
            _ = tokio::time::sleep(interval) => {}
        }
        ctx.report_progress_with_message(
            step as f64,
            Some(total),
            &format!("{} remaining", params.steps - step),
        );
    }

    Ok(ToolCallResult::text(format!(
        "Countdown of {} finished",
        params.steps
    )))
}
