//! Resource: hostcap://server/info

use serde_json::json;

use crate::config::ServerConfig;
use crate::types::{ResourceContent, ResourceDefinition, SUPPORTED_VERSIONS};

pub const URI: &str = "hostcap://server/info";

pub fn definition() -> ResourceDefinition {
    ResourceDefinition {
        uri: URI.to_string(),
        name: "Server info".to_string(),
        description: Some("Name, version and supported protocol versions".to_string()),
        mime_type: Some("application/json".to_string()),
    }
}

pub fn read(config: &ServerConfig, started_at: &str) -> ResourceContent {
    let content = json!({
        "name": config.name,
        "version": config.version,
        "protocol_versions": SUPPORTED_VERSIONS,
        "started_at": started_at,
    });

    ResourceContent::text(
        URI,
        "application/json",
        serde_json::to_string_pretty(&content).unwrap_or_default(),
    )
}
