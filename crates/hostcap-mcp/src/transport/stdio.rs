//! Stdio transport: reads JSON-RPC from stdin, writes to stdout.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::protocol::ProtocolHandler;
use crate::types::{McpError, McpResult, RequestId};

use super::framing;
use super::outbound::OutboundReceiver;

/// Stdio transport for desktop MCP clients.
///
/// One loop reads lines and hands them to the handler; a separate task owns
/// the writer and drains the outbound queue, so replies and notifications
/// from concurrent requests never interleave within a line.
pub struct StdioTransport {
    handler: ProtocolHandler,
    outbound_rx: OutboundReceiver,
}

impl StdioTransport {
    pub fn new(handler: ProtocolHandler, outbound_rx: OutboundReceiver) -> Self {
        Self {
            handler,
            outbound_rx,
        }
    }

    /// Run the transport loop over the process's stdin and stdout.
    pub async fn run(self) -> McpResult<()> {
        self.run_with(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Run the transport loop over any byte stream pair. Returns once the
    /// input ends, the handler is closed, or either side fails.
    pub async fn run_with<R, W>(self, reader: R, writer: W) -> McpResult<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let StdioTransport {
            handler,
            outbound_rx,
        } = self;

        let stop = CancellationToken::new();
        let writer_task = {
            let handler = handler.clone();
            let stop = stop.clone();
            tokio::spawn(async move {
                let result = write_loop(outbound_rx, writer, stop).await;
                if let Err(e) = &result {
                    tracing::error!("Transport write error: {e}");
                    handler.close();
                }
                result
            })
        };

        tracing::info!("Stdio transport started");
        let mut in_flight = Vec::new();
        let read_result = read_loop(&handler, reader, &mut in_flight).await;
        if let Err(e) = &read_result {
            tracing::error!("Transport read error: {e}");
        }

        // Every way out of the read loop ends the session.
        handler.close();
        drain(in_flight, handler.config().drain_timeout).await;

        stop.cancel();
        let write_result = match writer_task.await {
            Ok(result) => result,
            Err(e) => Err(McpError::Transport(format!("writer task failed: {e}"))),
        };

        tracing::info!("Stdio transport stopped");
        read_result.and(write_result)
    }
}

async fn read_loop<R>(
    handler: &ProtocolHandler,
    reader: R,
    in_flight: &mut Vec<JoinHandle<()>>,
) -> McpResult<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let closed = handler.closed();

    loop {
        buf.clear();
        let bytes_read = tokio::select! {
            read = reader.read_until(b'\n', &mut buf) => read.map_err(McpError::Io)?,
            _ = closed.cancelled() => {
                tracing::info!("Handler closed, stopping transport");
                return Ok(());
            }
        };

        if bytes_read == 0 {
            tracing::info!("EOF on stdin, shutting down");
            return Ok(());
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(e) => {
                let err = McpError::ParseError(format!("Invalid UTF-8: {e}"));
                tracing::warn!("Rejecting inbound line: {err}");
                handler.outbound().send(err.to_json_rpc_error(RequestId::Null));
                continue;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match framing::parse_message(trimmed) {
            Ok(msg) => {
                if let Some(task) = handler.dispatch(msg) {
                    in_flight.retain(|t| !t.is_finished());
                    in_flight.push(task);
                }
            }
            Err(e) => {
                tracing::warn!("Rejecting inbound line: {e}");
                handler.outbound().send(framing::error_reply(trimmed, &e));
            }
        }
    }
}

async fn write_loop<W>(
    mut rx: OutboundReceiver,
    mut writer: W,
    stop: CancellationToken,
) -> McpResult<()>
where
    W: AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            biased;
            msg = rx.recv() => match msg {
                Some(msg) => write_line(&mut writer, &framing::frame_message(&msg)?).await?,
                None => break,
            },
            _ = stop.cancelled() => {
                while let Ok(msg) = rx.try_recv() {
                    write_line(&mut writer, &framing::frame_message(&msg)?).await?;
                }
                break;
            }
        }
    }
    writer.flush().await.map_err(McpError::Io)
}

async fn write_line<W>(writer: &mut W, framed: &str) -> McpResult<()>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(framed.as_bytes())
        .await
        .map_err(McpError::Io)?;
    writer.flush().await.map_err(McpError::Io)
}

/// Wait for in-flight requests to send their replies, up to `timeout`.
async fn drain(in_flight: Vec<JoinHandle<()>>, timeout: Duration) {
    let remaining: Vec<_> = in_flight.into_iter().filter(|t| !t.is_finished()).collect();
    if remaining.is_empty() {
        return;
    }

    let count = remaining.len();
    tracing::debug!("Waiting for {count} in-flight request(s)");
    let wait = async {
        for task in remaining {
            if let Err(e) = task.await {
                tracing::warn!("Request task failed: {e}");
            }
        }
    };
    if tokio::time::timeout(timeout, wait).await.is_err() {
        tracing::warn!("Gave up waiting for in-flight requests after {timeout:?}");
    }
}
