//! Resource template: hostcap://echo/{message}

use crate::resources::ResourceRequest;
use crate::types::{McpError, McpResult, ResourceContent, ResourceTemplateDefinition};

pub const URI_TEMPLATE: &str = "hostcap://echo/{message}";

pub fn definition() -> ResourceTemplateDefinition {
    ResourceTemplateDefinition {
        uri_template: URI_TEMPLATE.to_string(),
        name: "Echo".to_string(),
        description: Some("Reads back the last path segment as plain text".to_string()),
        mime_type: Some("text/plain".to_string()),
    }
}

pub fn read(request: &ResourceRequest) -> McpResult<ResourceContent> {
    let message = request
        .params
        .get("message")
        .ok_or_else(|| McpError::InvalidParams("missing message segment".to_string()))?;
    Ok(ResourceContent::text(
        &request.uri,
        "text/plain",
        message.clone(),
    ))
}
