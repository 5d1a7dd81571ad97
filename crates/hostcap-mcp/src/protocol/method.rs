//! The closed set of methods this server understands.

/// Request methods, keyed by their MCP wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    Initialize,
    Ping,
    Shutdown,
    ListTools,
    CallTool,
    ListResources,
    ListResourceTemplates,
    ReadResource,
    Subscribe,
    Unsubscribe,
    ListPrompts,
    GetPrompt,
    SetLogLevel,
}

impl RequestMethod {
    pub const ALL: [RequestMethod; 13] = [
        RequestMethod::Initialize,
        RequestMethod::Ping,
        RequestMethod::Shutdown,
        RequestMethod::ListTools,
        RequestMethod::CallTool,
        RequestMethod::ListResources,
        RequestMethod::ListResourceTemplates,
        RequestMethod::ReadResource,
        RequestMethod::Subscribe,
        RequestMethod::Unsubscribe,
        RequestMethod::ListPrompts,
        RequestMethod::GetPrompt,
        RequestMethod::SetLogLevel,
    ];

    pub fn parse(method: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == method)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestMethod::Initialize => "initialize",
            RequestMethod::Ping => "ping",
            RequestMethod::Shutdown => "shutdown",
            RequestMethod::ListTools => "tools/list",
            RequestMethod::CallTool => "tools/call",
            RequestMethod::ListResources => "resources/list",
            RequestMethod::ListResourceTemplates => "resources/templates/list",
            RequestMethod::ReadResource => "resources/read",
            RequestMethod::Subscribe => "resources/subscribe",
            RequestMethod::Unsubscribe => "resources/unsubscribe",
            RequestMethod::ListPrompts => "prompts/list",
            RequestMethod::GetPrompt => "prompts/get",
            RequestMethod::SetLogLevel => "logging/setLevel",
        }
    }

    /// Whether the method is only served once the session is ready.
    /// `initialize`, `ping` and `shutdown` manage or probe the lifecycle
    /// itself and are exempt.
    pub fn requires_ready(self) -> bool {
        !matches!(
            self,
            RequestMethod::Initialize | RequestMethod::Ping | RequestMethod::Shutdown
        )
    }
}

impl std::fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound notifications the server acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationMethod {
    Initialized,
    Cancelled,
}

impl NotificationMethod {
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            "notifications/initialized" | "initialized" => Some(NotificationMethod::Initialized),
            "notifications/cancelled" | "$/cancelRequest" => Some(NotificationMethod::Cancelled),
            _ => None,
        }
    }
}
