//! JSON-RPC message validation and argument shape checks.

use serde_json::{Map, Value};

use crate::types::{JsonRpcRequest, McpError, McpResult, RequestId, JSONRPC_VERSION};

/// Validate that a JSON-RPC request is well-formed.
pub fn validate_request(request: &JsonRpcRequest) -> McpResult<()> {
    if request.jsonrpc != JSONRPC_VERSION {
        return Err(McpError::InvalidRequest(format!(
            "Expected jsonrpc version \"{JSONRPC_VERSION}\", got \"{}\"",
            request.jsonrpc
        )));
    }

    if request.method.is_empty() {
        return Err(McpError::InvalidRequest(
            "Method name must not be empty".to_string(),
        ));
    }

    if request.id == RequestId::Null {
        return Err(McpError::InvalidRequest(
            "Request id must not be null".to_string(),
        ));
    }

    Ok(())
}

/// Arguments must be absent or a JSON object; absent becomes `{}`.
pub fn arguments_object(arguments: Option<Value>) -> McpResult<Map<String, Value>> {
    match arguments {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(McpError::InvalidParams(format!(
            "arguments must be an object, got {}",
            type_name(&other)
        ))),
    }
}

/// Check tool arguments against the tool's declared input schema: every
/// `required` key must be present and every declared property with a
/// primitive `type` must have that type.
pub fn validate_tool_arguments(schema: &Value, args: &Map<String, Value>) -> McpResult<()> {
    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for key in required.iter().filter_map(Value::as_str) {
            if !args.contains_key(key) {
                return Err(McpError::InvalidParams(format!(
                    "missing required argument '{key}'"
                )));
            }
        }
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };

    for (key, value) in args {
        let Some(expected) = properties
            .get(key)
            .and_then(|p| p.get("type"))
            .and_then(Value::as_str)
        else {
            continue;
        };
        if !matches_type(expected, value) {
            return Err(McpError::InvalidParams(format!(
                "argument '{key}' must be of type {expected}, got {}",
                type_name(value)
            )));
        }
    }

    Ok(())
}

/// Every argument a prompt marks as required must be supplied.
pub fn validate_prompt_arguments<'a>(
    required: impl Iterator<Item = &'a str>,
    args: &Map<String, Value>,
) -> McpResult<()> {
    for key in required {
        if !args.contains_key(key) {
            return Err(McpError::InvalidParams(format!(
                "missing required argument '{key}'"
            )));
        }
    }
    Ok(())
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
