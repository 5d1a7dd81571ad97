//! Tool: current_time. Reports the server's clock, optionally formatted.

use anyhow::bail;
use chrono::format::{Item, StrftimeItems};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::context::RequestContext;
use crate::types::{ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct TimeParams {
    #[serde(default)]
    format: Option<String>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "current_time".to_string(),
        description: Some("Current UTC time as RFC 3339 and Unix seconds".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "format": {
                    "type": "string",
                    "description": "Optional strftime pattern, e.g. \"%Y-%m-%d %H:%M\""
                }
            }
        }),
    }
}

pub async fn execute(args: Value, _ctx: RequestContext) -> anyhow::Result<ToolCallResult> {
    let params: TimeParams = serde_json::from_value(args)?;
    let now = Utc::now();

    let formatted = match params.format.as_deref() {
        Some(pattern) => {
            let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
            if items.iter().any(|item| matches!(item, Item::Error)) {
                bail!("invalid format pattern: {pattern}");
            }
            Some(now.format_with_items(items.into_iter()).to_string())
        }
        None => None,
    };

    Ok(ToolCallResult::json(&json!({
        "utc": now.to_rfc3339(),
        "unix": now.timestamp(),
        "formatted": formatted,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_pattern_detected() {
        let items: Vec<Item<'_>> = StrftimeItems::new("%Q").collect();
        assert!(items.iter().any(|item| matches!(item, Item::Error)));
    }
}
