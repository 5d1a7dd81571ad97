//! Outbound half of the connection: a non-blocking message queue drained by
//! the transport's writer.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::types::{JsonRpcMessage, JsonRpcNotification};

/// Receiving end, owned by whichever transport writes to the peer.
pub type OutboundReceiver = mpsc::UnboundedReceiver<JsonRpcMessage>;

/// Cloneable handle for sending messages to the peer.
///
/// `send` never blocks. Once the receiving side is gone every send is
/// dropped and reported as `false`.
#[derive(Debug, Clone)]
pub struct Outbound {
    tx: mpsc::UnboundedSender<JsonRpcMessage>,
}

impl Outbound {
    pub fn channel() -> (Self, OutboundReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send(&self, message: impl Into<JsonRpcMessage>) -> bool {
        match self.tx.send(message.into()) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("Dropping outbound message, transport closed: {:?}", e.0.id());
                false
            }
        }
    }

    /// Serialize `params` and send them as a notification.
    pub fn notify(&self, method: &str, params: &impl Serialize) -> bool {
        match serde_json::to_value(params) {
            Ok(value) => self.send(JsonRpcNotification::new(method, Some(value))),
            Err(e) => {
                tracing::error!("Failed to serialize {method} params: {e}");
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
