//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::time::Duration;

use serde_json::{json, Value};
use tokio::task::JoinHandle;

use hostcap_mcp::config::ServerConfig;
use hostcap_mcp::protocol::ProtocolHandler;
use hostcap_mcp::tools::Tool;
use hostcap_mcp::transport::{Outbound, OutboundReceiver};
use hostcap_mcp::types::*;

/// A fresh handler in the `uninitialized` phase with its outbound queue.
pub fn new_handler() -> (ProtocolHandler, OutboundReceiver) {
    let (outbound, rx) = Outbound::channel();
    (ProtocolHandler::new(ServerConfig::default(), outbound), rx)
}

/// A handler that has completed the initialize handshake.
pub async fn ready_handler() -> (ProtocolHandler, OutboundReceiver) {
    let (handler, rx) = new_handler();
    let resp = send_unwrap(&handler, init_request()).await;
    assert!(resp.get("result").is_some(), "initialize failed: {resp}");
    send(&handler, notification("notifications/initialized", None)).await;
    (handler, rx)
}

/// Build an MCP JSON-RPC request.
pub fn mcp_request(id: i64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    })
}

/// Build a JSON-RPC notification.
pub fn notification(method: &str, params: Option<Value>) -> Value {
    match params {
        Some(params) => json!({ "jsonrpc": "2.0", "method": method, "params": params }),
        None => json!({ "jsonrpc": "2.0", "method": method }),
    }
}

/// Build an initialize request.
pub fn init_request() -> Value {
    init_request_as(0, "test-client")
}

pub fn init_request_as(id: i64, client: &str) -> Value {
    mcp_request(
        id,
        "initialize",
        json!({
            "protocolVersion": "2025-06-18",
            "capabilities": {},
            "clientInfo": { "name": client, "version": "1.0" }
        }),
    )
}

pub fn call_tool(id: i64, name: &str, arguments: Value) -> Value {
    mcp_request(id, "tools/call", json!({ "name": name, "arguments": arguments }))
}

pub fn cancel(id: i64) -> Value {
    notification(
        "notifications/cancelled",
        Some(json!({ "requestId": id, "reason": "test" })),
    )
}

/// Send a JSON-RPC message through the handler and return the reply.
pub async fn send(handler: &ProtocolHandler, msg: Value) -> Option<Value> {
    let parsed: JsonRpcMessage = serde_json::from_value(msg).unwrap();
    handler
        .handle_message(parsed)
        .await
        .map(|reply| serde_json::to_value(reply).unwrap())
}

/// Hand a message to the transport-facing entry point, which replies through
/// the outbound queue.
pub fn dispatch(handler: &ProtocolHandler, msg: Value) -> Option<JoinHandle<()>> {
    let parsed: JsonRpcMessage = serde_json::from_value(msg).unwrap();
    handler.dispatch(parsed)
}

/// Send and unwrap the reply.
pub async fn send_unwrap(handler: &ProtocolHandler, msg: Value) -> Value {
    send(handler, msg).await.expect("expected response")
}

pub fn error_code(resp: &Value) -> i64 {
    resp["error"]["code"]
        .as_i64()
        .unwrap_or_else(|| panic!("expected error response, got {resp}"))
}

pub fn result_text(resp: &Value) -> String {
    resp["result"]["content"][0]["text"]
        .as_str()
        .unwrap_or_else(|| panic!("expected text content, got {resp}"))
        .to_string()
}

pub fn tool_def(name: &str) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: Some(format!("test tool {name}")),
        input_schema: json!({ "type": "object" }),
    }
}

/// A tool that blocks until its request is cancelled, then returns
/// normally so the dispatcher has to notice the cancellation itself.
pub fn blocking_tool(name: &str) -> Tool {
    Tool::new(tool_def(name), |_args: Value, ctx| async move {
        ctx.cancelled().await;
        Ok::<_, anyhow::Error>(ToolCallResult::text("finished anyway".to_string()))
    })
}

/// Poll until `n` tool calls are in flight.
pub async fn wait_for_pending(handler: &ProtocolHandler, n: usize) {
    for _ in 0..400 {
        if handler.pending_count() == n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "expected {n} pending request(s), found {}",
        handler.pending_count()
    );
}

/// Drain everything currently queued for the client.
pub fn drain_outbound(rx: &mut OutboundReceiver) -> Vec<Value> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(serde_json::to_value(msg).unwrap());
    }
    out
}
