//! Cancellation, progress and concurrent tool calls.

mod common;

use std::time::Duration;

use serde_json::{json, Value};

use hostcap_mcp::builtin;
use hostcap_mcp::tools::Tool;
use hostcap_mcp::types::*;

use common::*;

fn sleeper(name: &str, millis: u64) -> Tool {
    Tool::new(tool_def(name), move |_args: Value, _ctx| async move {
        tokio::time::sleep(Duration::from_millis(millis)).await;
        Ok::<_, anyhow::Error>(ToolCallResult::text(format!("slept {millis}ms")))
    })
}

#[tokio::test]
async fn test_cancel_running_handler_yields_request_cancelled() {
    let (handler, _rx) = ready_handler().await;
    handler.register_tool(blocking_tool("block"));

    let call = {
        let handler = handler.clone();
        tokio::spawn(async move { send_unwrap(&handler, call_tool(5, "block", json!({}))).await })
    };
    wait_for_pending(&handler, 1).await;

    assert!(send(&handler, cancel(5)).await.is_none());
    // A second cancel for the same id is a no-op.
    assert!(send(&handler, cancel(5)).await.is_none());

    let resp = call.await.unwrap();
    assert_eq!(resp["id"], 5);
    assert_eq!(error_code(&resp), mcp_error_codes::REQUEST_CANCELLED as i64);
    assert_eq!(handler.pending_count(), 0);
}

#[tokio::test]
async fn test_cancel_request_alias() {
    let (handler, _rx) = ready_handler().await;
    handler.register_tool(blocking_tool("block"));

    let call = {
        let handler = handler.clone();
        tokio::spawn(async move { send_unwrap(&handler, call_tool(8, "block", json!({}))).await })
    };
    wait_for_pending(&handler, 1).await;

    send(
        &handler,
        notification("$/cancelRequest", Some(json!({ "requestId": 8 }))),
    )
    .await;

    let resp = call.await.unwrap();
    assert_eq!(error_code(&resp), mcp_error_codes::REQUEST_CANCELLED as i64);
}

#[tokio::test]
async fn test_cancel_unknown_or_finished_is_noop() {
    let (handler, _rx) = ready_handler().await;
    builtin::install(&handler);

    assert!(send(&handler, cancel(404)).await.is_none());

    let resp = send_unwrap(&handler, call_tool(1, "echo", json!({"message": "done"}))).await;
    assert_eq!(result_text(&resp), "done");
    assert!(send(&handler, cancel(1)).await.is_none());
    assert_eq!(handler.pending_count(), 0);
}

#[tokio::test]
async fn test_cancel_only_hits_target_request() {
    let (handler, _rx) = ready_handler().await;
    handler.register_tool(blocking_tool("block"));
    handler.register_tool(sleeper("nap", 50));

    let blocked = {
        let handler = handler.clone();
        tokio::spawn(async move { send_unwrap(&handler, call_tool(1, "block", json!({}))).await })
    };
    let napping = {
        let handler = handler.clone();
        tokio::spawn(async move { send_unwrap(&handler, call_tool(2, "nap", json!({}))).await })
    };
    wait_for_pending(&handler, 2).await;

    send(&handler, cancel(1)).await;

    let resp = blocked.await.unwrap();
    assert_eq!(error_code(&resp), mcp_error_codes::REQUEST_CANCELLED as i64);
    let resp = napping.await.unwrap();
    assert_eq!(result_text(&resp), "slept 50ms");
}

#[tokio::test]
async fn test_cancel_right_behind_dispatched_call() {
    let (handler, mut rx) = ready_handler().await;
    handler.register_tool(blocking_tool("block"));
    drain_outbound(&mut rx);

    // No yield between the two: the call task has not started yet.
    let call = dispatch(&handler, call_tool(7, "block", json!({}))).unwrap();
    assert_eq!(handler.pending_count(), 1);
    assert!(dispatch(&handler, cancel(7)).is_none());

    call.await.unwrap();
    let sent = drain_outbound(&mut rx);
    assert_eq!(sent.len(), 1, "{sent:?}");
    assert_eq!(sent[0]["id"], 7);
    assert_eq!(error_code(&sent[0]), mcp_error_codes::REQUEST_CANCELLED as i64);
    assert_eq!(handler.pending_count(), 0);
}

#[tokio::test]
async fn test_dispatch_rejects_duplicate_id_immediately() {
    let (handler, mut rx) = ready_handler().await;
    handler.register_tool(blocking_tool("block"));
    drain_outbound(&mut rx);

    let first = dispatch(&handler, call_tool(3, "block", json!({}))).unwrap();
    assert!(dispatch(&handler, call_tool(3, "block", json!({}))).is_none());

    let sent = drain_outbound(&mut rx);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["id"], 3);
    assert_eq!(error_code(&sent[0]), error_codes::INVALID_REQUEST as i64);
    assert_eq!(handler.pending_count(), 1);

    dispatch(&handler, cancel(3));
    first.await.unwrap();
    let sent = drain_outbound(&mut rx);
    assert_eq!(error_code(&sent[0]), mcp_error_codes::REQUEST_CANCELLED as i64);
}

#[tokio::test]
async fn test_concurrent_calls_complete_independently() {
    let (handler, _rx) = ready_handler().await;
    handler.register_tool(sleeper("slow", 200));
    handler.register_tool(sleeper("fast", 10));

    let (done_tx, mut done_rx) = tokio::sync::mpsc::unbounded_channel();
    for (id, name) in [(1, "slow"), (2, "fast")] {
        let handler = handler.clone();
        let done_tx = done_tx.clone();
        tokio::spawn(async move {
            let resp = send_unwrap(&handler, call_tool(id, name, json!({}))).await;
            done_tx.send(resp).unwrap();
        });
    }

    let first = done_rx.recv().await.unwrap();
    let second = done_rx.recv().await.unwrap();
    assert_eq!(first["id"], 2, "the fast call must not wait for the slow one");
    assert_eq!(second["id"], 1);
    assert_eq!(result_text(&first), "slept 10ms");
    assert_eq!(result_text(&second), "slept 200ms");
}

#[tokio::test]
async fn test_duplicate_in_flight_id_rejected() {
    let (handler, _rx) = ready_handler().await;
    handler.register_tool(blocking_tool("block"));

    let first = {
        let handler = handler.clone();
        tokio::spawn(async move { send_unwrap(&handler, call_tool(3, "block", json!({}))).await })
    };
    wait_for_pending(&handler, 1).await;

    let resp = send_unwrap(&handler, call_tool(3, "block", json!({}))).await;
    assert_eq!(error_code(&resp), error_codes::INVALID_REQUEST as i64);
    assert_eq!(handler.pending_count(), 1, "the first entry must survive");

    send(&handler, cancel(3)).await;
    let resp = first.await.unwrap();
    assert_eq!(error_code(&resp), mcp_error_codes::REQUEST_CANCELLED as i64);

    // The id is free again once the first call has finished.
    handler.register_tool(sleeper("block", 1));
    let resp = send_unwrap(&handler, call_tool(3, "block", json!({}))).await;
    assert_eq!(result_text(&resp), "slept 1ms");
}

#[tokio::test]
async fn test_progress_uses_meta_token() {
    let (handler, mut rx) = ready_handler().await;
    builtin::install(&handler);
    drain_outbound(&mut rx);

    let resp = send_unwrap(
        &handler,
        mcp_request(
            1,
            "tools/call",
            json!({
                "name": "countdown",
                "arguments": { "steps": 3, "interval_ms": 1 },
                "_meta": { "progressToken": "cd-1" }
            }),
        ),
    )
    .await;
    assert_eq!(result_text(&resp), "Countdown of 3 finished");

    let progress: Vec<Value> = drain_outbound(&mut rx)
        .into_iter()
        .filter(|n| n["method"] == NOTIFY_PROGRESS)
        .collect();
    assert_eq!(progress.len(), 3);
    for (i, note) in progress.iter().enumerate() {
        assert_eq!(note["params"]["progressToken"], "cd-1");
        assert_eq!(note["params"]["progress"], (i + 1) as f64);
        assert_eq!(note["params"]["total"], 3.0);
    }
}

#[tokio::test]
async fn test_progress_defaults_to_request_id() {
    let (handler, mut rx) = ready_handler().await;
    builtin::install(&handler);
    drain_outbound(&mut rx);

    send_unwrap(
        &handler,
        call_tool(42, "countdown", json!({ "steps": 1, "interval_ms": 1 })),
    )
    .await;

    let sent = drain_outbound(&mut rx);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["params"]["progressToken"], 42);
}

#[tokio::test]
async fn test_cancel_countdown_midway() {
    let (handler, mut rx) = ready_handler().await;
    builtin::install(&handler);
    drain_outbound(&mut rx);

    let call = {
        let handler = handler.clone();
        tokio::spawn(async move {
            send_unwrap(
                &handler,
                call_tool(9, "countdown", json!({ "steps": 1000, "interval_ms": 20 })),
            )
            .await
        })
    };
    wait_for_pending(&handler, 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    send(&handler, cancel(9)).await;

    let resp = call.await.unwrap();
    assert_eq!(error_code(&resp), mcp_error_codes::REQUEST_CANCELLED as i64);
    let progress = drain_outbound(&mut rx)
        .into_iter()
        .filter(|n| n["method"] == NOTIFY_PROGRESS)
        .count();
    assert!(progress < 1000);
}
