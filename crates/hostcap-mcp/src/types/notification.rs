//! MCP notification types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::message::RequestId;

pub const NOTIFY_TOOLS_LIST_CHANGED: &str = "notifications/tools/list_changed";
pub const NOTIFY_RESOURCES_LIST_CHANGED: &str = "notifications/resources/list_changed";
pub const NOTIFY_PROMPTS_LIST_CHANGED: &str = "notifications/prompts/list_changed";
pub const NOTIFY_RESOURCE_UPDATED: &str = "notifications/resources/updated";
pub const NOTIFY_PROGRESS: &str = "notifications/progress";
pub const NOTIFY_MESSAGE: &str = "notifications/message";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProgressToken {
    String(String),
    Number(i64),
}

impl From<&RequestId> for ProgressToken {
    fn from(id: &RequestId) -> Self {
        match id {
            RequestId::String(s) => ProgressToken::String(s.clone()),
            RequestId::Number(n) => ProgressToken::Number(*n),
            RequestId::Null => ProgressToken::String("null".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressParams {
    pub progress_token: ProgressToken,
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogMessageParams {
    pub level: LogLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,
    pub data: Value,
}

/// Syslog severities used by `logging/setLevel`, least severe first so the
/// derived ordering can be used as a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceUpdatedParams {
    pub uri: String,
}

/// Which registry a list-changed notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Tools,
    Resources,
    Prompts,
}

impl ListKind {
    pub fn notification_method(self) -> &'static str {
        match self {
            ListKind::Tools => NOTIFY_TOOLS_LIST_CHANGED,
            ListKind::Resources => NOTIFY_RESOURCES_LIST_CHANGED,
            ListKind::Prompts => NOTIFY_PROMPTS_LIST_CHANGED,
        }
    }
}
