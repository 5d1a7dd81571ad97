//! Per-request context handed to tool, resource and prompt handlers.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::logging::PeerLogger;
use crate::transport::Outbound;
use crate::types::{LogLevel, ProgressParams, ProgressToken, RequestId, NOTIFY_PROGRESS};

/// A boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a handler can see and do while serving one request.
///
/// Cancellation is cooperative: long-running handlers should poll
/// [`is_cancelled`](Self::is_cancelled) or race their work against
/// [`cancelled`](Self::cancelled).
#[derive(Clone)]
pub struct RequestContext {
    request_id: RequestId,
    progress_token: ProgressToken,
    cancel: CancellationToken,
    outbound: Outbound,
    logger: Arc<PeerLogger>,
}

impl RequestContext {
    pub(crate) fn new(
        request_id: RequestId,
        progress_token: Option<ProgressToken>,
        cancel: CancellationToken,
        outbound: Outbound,
        logger: Arc<PeerLogger>,
    ) -> Self {
        let progress_token = progress_token.unwrap_or_else(|| ProgressToken::from(&request_id));
        Self {
            request_id,
            progress_token,
            cancel,
            outbound,
            logger,
        }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn progress_token(&self) -> &ProgressToken {
        &self.progress_token
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the request has been cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    /// A token that fires with this request's cancellation, for passing
    /// down into nested work.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// Emit a `notifications/progress` for this request. Best effort.
    pub fn report_progress(&self, progress: f64, total: Option<f64>) {
        self.send_progress(progress, total, None);
    }

    pub fn report_progress_with_message(&self, progress: f64, total: Option<f64>, message: &str) {
        self.send_progress(progress, total, Some(message.to_string()));
    }

    fn send_progress(&self, progress: f64, total: Option<f64>, message: Option<String>) {
        self.outbound.notify(
            NOTIFY_PROGRESS,
            &ProgressParams {
                progress_token: self.progress_token.clone(),
                progress,
                total,
                message,
            },
        );
    }

    pub fn log(&self, level: LogLevel, data: impl Into<Value>) {
        self.logger.log(level, None, data.into());
    }

    pub fn log_as(&self, level: LogLevel, logger: &str, data: impl Into<Value>) {
        self.logger.log(level, Some(logger), data.into());
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("progress_token", &self.progress_token)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JsonRpcMessage;

    fn context(token: Option<ProgressToken>) -> (RequestContext, crate::transport::OutboundReceiver) {
        let (outbound, rx) = Outbound::channel();
        let logger = Arc::new(PeerLogger::new(outbound.clone()));
        let ctx = RequestContext::new(
            RequestId::Number(11),
            token,
            CancellationToken::new(),
            outbound,
            logger,
        );
        (ctx, rx)
    }

    #[tokio::test]
    async fn test_progress_defaults_to_request_id() {
        let (ctx, mut rx) = context(None);
        ctx.report_progress(1.0, Some(4.0));

        let Some(JsonRpcMessage::Notification(n)) = rx.recv().await else {
            panic!("expected progress notification");
        };
        let params = n.params.unwrap();
        assert_eq!(params["progressToken"], 11);
        assert_eq!(params["progress"], 1.0);
        assert_eq!(params["total"], 4.0);
    }

    #[tokio::test]
    async fn test_explicit_progress_token_wins() {
        let (ctx, mut rx) = context(Some(ProgressToken::String("tok".to_string())));
        ctx.report_progress_with_message(0.5, None, "halfway");

        let Some(JsonRpcMessage::Notification(n)) = rx.recv().await else {
            panic!("expected progress notification");
        };
        let params = n.params.unwrap();
        assert_eq!(params["progressToken"], "tok");
        assert_eq!(params["message"], "halfway");
        assert!(params.get("total").is_none());
    }

    #[test]
    fn test_child_token_follows_parent() {
        let (ctx, _rx) = context(None);
        let child = ctx.cancellation_token();
        assert!(!child.is_cancelled());
        ctx.cancel.cancel();
        assert!(child.is_cancelled());
        assert!(ctx.is_cancelled());
    }
}
