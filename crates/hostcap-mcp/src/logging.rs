//! Peer-facing logging: records go to `tracing` and, once the client asked
//! for them with `logging/setLevel`, to the client as `notifications/message`.

use parking_lot::RwLock;
use serde_json::Value;

use crate::transport::Outbound;
use crate::types::{LogLevel, LogMessageParams, NOTIFY_MESSAGE};

pub struct PeerLogger {
    threshold: RwLock<Option<LogLevel>>,
    outbound: Outbound,
}

impl PeerLogger {
    pub fn new(outbound: Outbound) -> Self {
        Self {
            threshold: RwLock::new(None),
            outbound,
        }
    }

    /// Minimum severity the client wants to receive.
    pub fn set_level(&self, level: LogLevel) {
        *self.threshold.write() = Some(level);
        tracing::info!("Client log level set to {level:?}");
    }

    pub fn level(&self) -> Option<LogLevel> {
        *self.threshold.read()
    }

    pub fn log(&self, level: LogLevel, logger: Option<&str>, data: Value) {
        let target = logger.unwrap_or("handler");
        match level {
            LogLevel::Debug => tracing::debug!(logger = target, "{data}"),
            LogLevel::Info | LogLevel::Notice => tracing::info!(logger = target, "{data}"),
            LogLevel::Warning => tracing::warn!(logger = target, "{data}"),
            _ => tracing::error!(logger = target, "{data}"),
        }

        let forward = self.level().is_some_and(|threshold| level >= threshold);
        if forward {
            self.outbound.notify(
                NOTIFY_MESSAGE,
                &LogMessageParams {
                    level,
                    logger: logger.map(str::to_string),
                    data,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JsonRpcMessage;
    use serde_json::json;

    #[tokio::test]
    async fn test_nothing_forwarded_until_level_set() {
        let (outbound, mut rx) = Outbound::channel();
        let logger = PeerLogger::new(outbound);

        logger.log(LogLevel::Error, None, json!("quiet"));
        assert!(rx.try_recv().is_err());

        logger.set_level(LogLevel::Warning);
        logger.log(LogLevel::Info, None, json!("below threshold"));
        logger.log(LogLevel::Error, Some("db"), json!("loud"));

        match rx.try_recv() {
            Ok(JsonRpcMessage::Notification(n)) => {
                assert_eq!(n.method, NOTIFY_MESSAGE);
                let params = n.params.unwrap();
                assert_eq!(params["level"], "error");
                assert_eq!(params["logger"], "db");
                assert_eq!(params["data"], "loud");
            }
            other => panic!("expected log notification, got {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }
}
