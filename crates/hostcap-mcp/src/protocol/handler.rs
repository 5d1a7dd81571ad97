//! Main request dispatcher: receives JSON-RPC messages, enforces the session
//! lifecycle and routes to the registries.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::context::RequestContext;
use crate::logging::PeerLogger;
use crate::prompts::{Prompt, PromptRegistry};
use crate::resources::{Resource, ResourceRegistry, ResourceTemplate};
use crate::session::{Phase, Session};
use crate::tools::{Tool, ToolRegistry};
use crate::transport::Outbound;
use crate::types::*;

use super::method::{NotificationMethod, RequestMethod};
use super::negotiation::{negotiate, validate_params};
use super::pending::{PendingGuard, PendingRequests};
use super::validator::{
    arguments_object, validate_prompt_arguments, validate_request, validate_tool_arguments,
};

struct Inner {
    config: ServerConfig,
    session: Mutex<Session>,
    tools: ToolRegistry,
    resources: ResourceRegistry,
    prompts: PromptRegistry,
    pending: Arc<PendingRequests>,
    outbound: Outbound,
    logger: Arc<PeerLogger>,
    /// Cancelled on every path into the `shutdown` phase.
    shutdown: CancellationToken,
    /// Cancelled by [`ProtocolHandler::close`]; the transport stops reading.
    closed: CancellationToken,
}

/// The protocol endpoint for one connection. Cheap to clone; every clone
/// shares the same session, registries and outbound queue.
#[derive(Clone)]
pub struct ProtocolHandler {
    inner: Arc<Inner>,
}

impl ProtocolHandler {
    pub fn new(config: ServerConfig, outbound: Outbound) -> Self {
        let logger = Arc::new(PeerLogger::new(outbound.clone()));
        Self {
            inner: Arc::new(Inner {
                config,
                session: Mutex::new(Session::new()),
                tools: ToolRegistry::new(),
                resources: ResourceRegistry::new(),
                prompts: PromptRegistry::new(),
                pending: Arc::new(PendingRequests::new()),
                outbound,
                logger,
                shutdown: CancellationToken::new(),
                closed: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    pub fn outbound(&self) -> &Outbound {
        &self.inner.outbound
    }

    pub fn phase(&self) -> Phase {
        self.inner.session.lock().phase()
    }

    /// Client identity recorded by `initialize`.
    pub fn peer_info(&self) -> Option<Implementation> {
        self.inner.session.lock().peer().cloned()
    }

    pub fn negotiated_version(&self) -> Option<String> {
        self.inner
            .session
            .lock()
            .negotiated()
            .map(|n| n.protocol_version.clone())
    }

    /// Number of tool invocations currently in flight.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    /// Force the session into `shutdown` and tell the transport to stop.
    pub fn close(&self) {
        self.shut_down("connection closed");
        self.inner.closed.cancel();
    }

    /// Token the transport watches for [`close`](Self::close).
    pub fn closed(&self) -> CancellationToken {
        self.inner.closed.clone()
    }

    fn shut_down(&self, reason: &str) {
        let changed = self.inner.session.lock().shut_down();
        let cancelled = self.inner.pending.cancel_all();
        self.inner.shutdown.cancel();
        if changed {
            tracing::info!("Session shut down ({reason}), cancelled {cancelled} in-flight request(s)");
        }
    }

    // ── registration ────────────────────────────────────────────────

    /// Upsert a tool. Returns whether an existing tool was replaced.
    pub fn register_tool(&self, tool: Tool) -> bool {
        let replaced = self.inner.tools.register(tool);
        self.notify_list_changed(ListKind::Tools);
        replaced
    }

    pub fn unregister_tool(&self, name: &str) -> bool {
        let removed = self.inner.tools.unregister(name);
        if removed {
            self.notify_list_changed(ListKind::Tools);
        }
        removed
    }

    pub fn register_resource(&self, resource: Resource) -> bool {
        let replaced = self.inner.resources.register(resource);
        self.notify_list_changed(ListKind::Resources);
        replaced
    }

    pub fn unregister_resource(&self, uri: &str) -> bool {
        let removed = self.inner.resources.unregister(uri);
        if removed {
            self.notify_list_changed(ListKind::Resources);
        }
        removed
    }

    pub fn register_resource_template(&self, template: ResourceTemplate) -> bool {
        let replaced = self.inner.resources.register_template(template);
        self.notify_list_changed(ListKind::Resources);
        replaced
    }

    pub fn unregister_resource_template(&self, uri_template: &str) -> bool {
        let removed = self.inner.resources.unregister_template(uri_template);
        if removed {
            self.notify_list_changed(ListKind::Resources);
        }
        removed
    }

    pub fn register_prompt(&self, prompt: Prompt) -> bool {
        let replaced = self.inner.prompts.register(prompt);
        self.notify_list_changed(ListKind::Prompts);
        replaced
    }

    pub fn unregister_prompt(&self, name: &str) -> bool {
        let removed = self.inner.prompts.unregister(name);
        if removed {
            self.notify_list_changed(ListKind::Prompts);
        }
        removed
    }

    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.inner.tools.list_tools()
    }

    pub fn list_resources(&self) -> Vec<ResourceDefinition> {
        self.inner.resources.list_resources()
    }

    pub fn list_resource_templates(&self) -> Vec<ResourceTemplateDefinition> {
        self.inner.resources.list_templates()
    }

    pub fn list_prompts(&self) -> Vec<PromptDefinition> {
        self.inner.prompts.list_prompts()
    }

    fn notify_list_changed(&self, kind: ListKind) {
        if !self.inner.session.lock().is_ready() {
            return;
        }
        tracing::debug!("Emitting {}", kind.notification_method());
        self.inner
            .outbound
            .send(JsonRpcNotification::new(kind.notification_method(), None));
    }

    /// Tell a subscribed client that `uri` changed. Returns whether a
    /// notification was sent.
    pub fn notify_resource_updated(&self, uri: &str) -> bool {
        {
            let session = self.inner.session.lock();
            if !session.is_ready() || !session.is_subscribed(uri) {
                return false;
            }
        }
        self.inner.outbound.notify(
            NOTIFY_RESOURCE_UPDATED,
            &ResourceUpdatedParams {
                uri: uri.to_string(),
            },
        )
    }

    // ── inbound ─────────────────────────────────────────────────────

    /// Process one message to completion and return the reply, if any.
    pub async fn handle_message(&self, msg: JsonRpcMessage) -> Option<JsonRpcMessage> {
        match msg {
            JsonRpcMessage::Request(req) => Some(self.handle_request(req).await),
            JsonRpcMessage::Notification(notif) => {
                self.handle_notification(notif);
                None
            }
            other => {
                tracing::warn!(
                    "Dropping unexpected response from client (id {:?})",
                    other.id()
                );
                None
            }
        }
    }

    /// Route one message from the transport. Requests run on their own task
    /// and reply through the outbound queue; notifications are handled
    /// before this returns.
    pub fn dispatch(&self, msg: JsonRpcMessage) -> Option<JoinHandle<()>> {
        match msg {
            JsonRpcMessage::Request(req) => {
                // A tool call is tracked before the next line is read, so a
                // cancellation that follows it on the wire always finds it.
                let guard = match self.track_tool_call(&req) {
                    Ok(guard) => guard,
                    Err(e) => {
                        tracing::warn!("Rejecting request {}: {e}", req.id);
                        self.inner.outbound.send(e.to_json_rpc_error(req.id));
                        return None;
                    }
                };
                let handler = self.clone();
                Some(tokio::spawn(async move {
                    let reply = handler.process_request(req, guard).await;
                    handler.inner.outbound.send(reply);
                }))
            }
            JsonRpcMessage::Notification(notif) => {
                self.handle_notification(notif);
                None
            }
            other => {
                tracing::warn!(
                    "Dropping unexpected response from client (id {:?})",
                    other.id()
                );
                None
            }
        }
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcMessage {
        self.process_request(request, None).await
    }

    fn track_tool_call(&self, request: &JsonRpcRequest) -> McpResult<Option<PendingGuard>> {
        if RequestMethod::parse(&request.method) != Some(RequestMethod::CallTool)
            || validate_request(request).is_err()
            || !self.inner.session.lock().is_ready()
        {
            return Ok(None);
        }
        self.inner.pending.track(request.id.clone()).map(Some)
    }

    async fn process_request(
        &self,
        request: JsonRpcRequest,
        guard: Option<PendingGuard>,
    ) -> JsonRpcMessage {
        if let Err(e) = validate_request(&request) {
            tracing::warn!("Rejecting malformed request: {e}");
            return e.to_json_rpc_error(request.id).into();
        }

        let id = request.id.clone();
        tracing::debug!("Dispatching {} (id {id})", request.method);

        match self.dispatch_request(request, guard).await {
            Ok(value) => JsonRpcResponse::new(id, value).into(),
            Err(e) => {
                tracing::debug!("Request {id} failed: {e}");
                e.to_json_rpc_error(id).into()
            }
        }
    }

    async fn dispatch_request(
        &self,
        request: JsonRpcRequest,
        guard: Option<PendingGuard>,
    ) -> McpResult<Value> {
        let method = RequestMethod::parse(&request.method)
            .ok_or_else(|| McpError::MethodNotFound(request.method.clone()))?;

        if method.requires_ready() {
            self.inner.session.lock().ensure_ready()?;
        }

        let JsonRpcRequest { id, params, .. } = request;
        match method {
            RequestMethod::Initialize => self.handle_initialize(params),
            RequestMethod::Ping => Ok(empty_result()),
            RequestMethod::Shutdown => self.handle_shutdown(),

            RequestMethod::ListTools => to_result(ToolListResult {
                tools: self.list_tools(),
            }),
            RequestMethod::CallTool => self.handle_tools_call(id, params, guard).await,

            RequestMethod::ListResources => to_result(ResourceListResult {
                resources: self.list_resources(),
            }),
            RequestMethod::ListResourceTemplates => to_result(ResourceTemplateListResult {
                resource_templates: self.list_resource_templates(),
            }),
            RequestMethod::ReadResource => self.handle_resources_read(id, params).await,
            RequestMethod::Subscribe => self.handle_subscribe(params),
            RequestMethod::Unsubscribe => self.handle_unsubscribe(params),

            RequestMethod::ListPrompts => to_result(PromptListResult {
                prompts: self.list_prompts(),
            }),
            RequestMethod::GetPrompt => self.handle_prompts_get(id, params).await,

            RequestMethod::SetLogLevel => self.handle_set_level(params),
        }
    }

    pub fn handle_notification(&self, notification: JsonRpcNotification) {
        match NotificationMethod::parse(&notification.method) {
            Some(NotificationMethod::Initialized) => {
                let mut session = self.inner.session.lock();
                if session.mark_ready() {
                    tracing::info!("Session ready");
                } else {
                    tracing::warn!(
                        "Ignoring initialized notification in phase {:?}",
                        session.phase()
                    );
                }
            }
            Some(NotificationMethod::Cancelled) => self.handle_cancelled(notification.params),
            None => {
                tracing::debug!("Unknown notification: {}", notification.method);
            }
        }
    }

    fn handle_cancelled(&self, params: Option<Value>) {
        let params: CancelRequestParams = match parse_params(params, "Cancel params required") {
            Ok(params) => params,
            Err(e) => {
                tracing::warn!("Ignoring malformed cancellation: {e}");
                return;
            }
        };
        let id: RequestId = match serde_json::from_value(params.request_id) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("Ignoring cancellation with unusable requestId: {e}");
                return;
            }
        };

        if self.inner.pending.cancel(&id) {
            tracing::info!(
                "Cancelled request {id}{}",
                params
                    .reason
                    .map(|r| format!(": {r}"))
                    .unwrap_or_default()
            );
        } else {
            tracing::debug!("Cancellation for unknown or finished request {id}");
        }
    }

    // ── lifecycle ───────────────────────────────────────────────────

    fn handle_initialize(&self, params: Option<Value>) -> McpResult<Value> {
        // One lock across check, validation and transition so that two
        // racing initialize requests cannot both succeed.
        let mut session = self.inner.session.lock();
        session.ensure_uninitialized()?;

        let init_params: InitializeParams = parse_params(params, "Initialize params required")?;
        validate_params(&init_params)?;

        let (negotiated, result) = negotiate(&init_params, &self.inner.config);
        session.begin(init_params.client_info.clone(), negotiated)?;
        drop(session);

        tracing::info!(
            "Initialized by {} {} (protocol {})",
            init_params.client_info.name,
            init_params.client_info.version,
            result.protocol_version
        );
        to_result(result)
    }

    fn handle_shutdown(&self) -> McpResult<Value> {
        tracing::info!("Shutdown requested");
        self.shut_down("shutdown request");
        Ok(empty_result())
    }

    // ── capabilities ────────────────────────────────────────────────

    async fn handle_tools_call(
        &self,
        id: RequestId,
        params: Option<Value>,
        guard: Option<PendingGuard>,
    ) -> McpResult<Value> {
        let call_params: ToolCallParams = parse_params(params, "Tool call params required")?;
        let arguments = arguments_object(call_params.arguments)?;

        let tool = self
            .inner
            .tools
            .get(&call_params.name)
            .ok_or_else(|| McpError::ToolNotFound(call_params.name.clone()))?;
        validate_tool_arguments(&tool.definition().input_schema, &arguments)?;

        let guard = match guard {
            Some(guard) => guard,
            None => self.inner.pending.track(id.clone())?,
        };
        if guard.is_cancelled() {
            return Err(McpError::RequestCancelled);
        }

        let progress_token = call_params.meta.and_then(|m| m.progress_token);
        let ctx = self.context(id, progress_token, guard.token().clone());

        let outcome = tokio::spawn(tool.call(Value::Object(arguments), ctx)).await;
        let cancelled = guard.is_cancelled();
        drop(guard);

        if cancelled {
            return Err(McpError::RequestCancelled);
        }

        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                tracing::debug!("Tool {} failed: {e:#}", call_params.name);
                ToolCallResult::error(format!("{e:#}"))
            }
            Err(e) if e.is_panic() => {
                tracing::error!("Tool {} panicked", call_params.name);
                ToolCallResult::error(format!("Tool '{}' panicked", call_params.name))
            }
            Err(_) => return Err(McpError::RequestCancelled),
        };
        to_result(result)
    }

    async fn handle_resources_read(&self, id: RequestId, params: Option<Value>) -> McpResult<Value> {
        let read_params: ResourceReadParams = parse_params(params, "Resource read params required")?;

        let (handler, request) = self
            .inner
            .resources
            .resolve(&read_params.uri)
            .ok_or_else(|| McpError::ResourceNotFound(read_params.uri.clone()))?;

        let ctx = self.context(id, None, self.inner.shutdown.child_token());
        let content = run_isolated(handler(request, ctx)).await??;

        to_result(ReadResourceResult {
            contents: vec![content],
        })
    }

    fn handle_subscribe(&self, params: Option<Value>) -> McpResult<Value> {
        let sub: ResourceSubscribeParams = parse_params(params, "Subscribe params required")?;
        if self.inner.resources.resolve(&sub.uri).is_none() {
            return Err(McpError::ResourceNotFound(sub.uri));
        }
        self.inner.session.lock().subscribe(&sub.uri);
        tracing::debug!("Subscribed to {}", sub.uri);
        Ok(empty_result())
    }

    fn handle_unsubscribe(&self, params: Option<Value>) -> McpResult<Value> {
        let sub: ResourceSubscribeParams = parse_params(params, "Unsubscribe params required")?;
        self.inner.session.lock().unsubscribe(&sub.uri);
        Ok(empty_result())
    }

    async fn handle_prompts_get(&self, id: RequestId, params: Option<Value>) -> McpResult<Value> {
        let get_params: PromptGetParams = parse_params(params, "Prompt get params required")?;

        let prompt = self
            .inner
            .prompts
            .get(&get_params.name)
            .ok_or_else(|| McpError::PromptNotFound(get_params.name.clone()))?;

        let arguments = arguments_object(get_params.arguments)?;
        validate_prompt_arguments(prompt.required_arguments(), &arguments)?;

        let ctx = self.context(id, None, self.inner.shutdown.child_token());
        let result = run_isolated(prompt.get(Value::Object(arguments), ctx)).await??;

        to_result(result)
    }

    fn handle_set_level(&self, params: Option<Value>) -> McpResult<Value> {
        let level_params: SetLevelParams = parse_params(params, "Log level params required")?;
        self.inner.logger.set_level(level_params.level);
        Ok(empty_result())
    }

    fn context(
        &self,
        id: RequestId,
        progress_token: Option<ProgressToken>,
        cancel: CancellationToken,
    ) -> RequestContext {
        RequestContext::new(
            id,
            progress_token,
            cancel,
            self.inner.outbound.clone(),
            Arc::clone(&self.inner.logger),
        )
    }
}

/// Run a handler on its own task so a panic becomes an internal error
/// instead of a missing reply.
async fn run_isolated<T: Send + 'static>(
    fut: impl Future<Output = T> + Send + 'static,
) -> McpResult<T> {
    tokio::spawn(fut).await.map_err(|e| {
        if e.is_panic() {
            McpError::InternalError("handler panicked".to_string())
        } else {
            McpError::RequestCancelled
        }
    })
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>, missing: &str) -> McpResult<T> {
    params
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| McpError::InvalidParams(e.to_string()))?
        .ok_or_else(|| McpError::InvalidParams(missing.to_string()))
}

fn to_result(value: impl Serialize) -> McpResult<Value> {
    serde_json::to_value(value).map_err(|e| McpError::InternalError(e.to_string()))
}

fn empty_result() -> Value {
    Value::Object(Map::new())
}
