//! Message framing for newline-delimited JSON.

use serde_json::Value;

use crate::types::{JsonRpcError, JsonRpcMessage, McpError, McpResult, RequestId};

/// Parse a single line of text as a JSON-RPC message.
///
/// Text that is not JSON is a parse error; JSON that is not a JSON-RPC
/// envelope is an invalid request.
pub fn parse_message(line: &str) -> McpResult<JsonRpcMessage> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(McpError::ParseError("Empty message".to_string()));
    }

    let value: Value =
        serde_json::from_str(trimmed).map_err(|e| McpError::ParseError(e.to_string()))?;

    serde_json::from_value(value)
        .map_err(|e| McpError::InvalidRequest(format!("Not a JSON-RPC 2.0 message: {e}")))
}

/// Build the reply for a line that failed to parse, echoing its id when one
/// can still be recovered.
pub fn error_reply(line: &str, error: &McpError) -> JsonRpcError {
    let id = serde_json::from_str::<Value>(line.trim())
        .ok()
        .and_then(|v| v.get("id").cloned())
        .and_then(|id| serde_json::from_value::<RequestId>(id).ok())
        .unwrap_or(RequestId::Null);
    error.to_json_rpc_error(id)
}

/// Serialize a message to a JSON line (with trailing newline).
pub fn frame_message(message: &JsonRpcMessage) -> McpResult<String> {
    let mut json = serde_json::to_string(message).map_err(McpError::Json)?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{error_codes, JsonRpcResponse};

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = parse_message(r#"{"broken":"#).unwrap_err();
        assert_eq!(err.code(), error_codes::PARSE_ERROR);
        assert!(parse_message("   ").is_err());
    }

    #[test]
    fn test_non_envelope_is_invalid_request() {
        let line = r#"{"id": 9, "hello": "world"}"#;
        let err = parse_message(line).unwrap_err();
        assert_eq!(err.code(), error_codes::INVALID_REQUEST);

        let reply = error_reply(line, &err);
        assert_eq!(reply.id, RequestId::Number(9));
    }

    #[test]
    fn test_error_reply_without_id_uses_null() {
        let err = parse_message("not json").unwrap_err();
        let reply = error_reply("not json", &err);
        assert_eq!(reply.id, RequestId::Null);
    }

    #[test]
    fn test_frame_is_single_line() {
        let msg = JsonRpcMessage::Response(JsonRpcResponse::new(
            RequestId::Number(1),
            serde_json::json!({"text": "a\nb"}),
        ));
        let framed = frame_message(&msg).unwrap();
        assert!(framed.ends_with('\n'));
        assert_eq!(framed.matches('\n').count(), 1);
    }
}
