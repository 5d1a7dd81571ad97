//! MCP capability negotiation during initialization.

use crate::config::ServerConfig;
use crate::types::{
    ClientCapabilities, Implementation, InitializeParams, InitializeResult, McpError, McpResult,
    ServerCapabilities, MCP_VERSION, SUPPORTED_VERSIONS,
};

/// What both sides settled on during `initialize`.
#[derive(Debug, Clone)]
pub struct NegotiatedCapabilities {
    pub client: ClientCapabilities,
    pub protocol_version: String,
}

/// Reject parameters that deserialized but are still unusable.
pub fn validate_params(params: &InitializeParams) -> McpResult<()> {
    if params.protocol_version.trim().is_empty() {
        return Err(McpError::InvalidParams(
            "protocolVersion must not be empty".to_string(),
        ));
    }
    if params.client_info.name.trim().is_empty() {
        return Err(McpError::InvalidParams(
            "clientInfo.name must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Pick the protocol version to speak: the client's if we support it,
/// otherwise our newest.
pub fn select_version(requested: &str) -> &'static str {
    match SUPPORTED_VERSIONS.iter().find(|v| **v == requested) {
        Some(v) => v,
        None => {
            tracing::warn!(
                "Client requested protocol version {requested}, server supports {}. Proceeding with server version.",
                SUPPORTED_VERSIONS.join(", ")
            );
            MCP_VERSION
        }
    }
}

pub fn negotiate(
    params: &InitializeParams,
    config: &ServerConfig,
) -> (NegotiatedCapabilities, InitializeResult) {
    let protocol_version = select_version(&params.protocol_version).to_string();

    let negotiated = NegotiatedCapabilities {
        client: params.capabilities.clone(),
        protocol_version: protocol_version.clone(),
    };

    let result = InitializeResult {
        protocol_version,
        capabilities: ServerCapabilities::default_capabilities(),
        server_info: Implementation {
            name: config.name.clone(),
            version: config.version.clone(),
        },
        instructions: config.instructions.clone(),
    };

    (negotiated, result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(version: &str, client: &str) -> InitializeParams {
        InitializeParams {
            protocol_version: version.to_string(),
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: client.to_string(),
                version: "0.1".to_string(),
            },
        }
    }

    #[test]
    fn test_supported_version_is_echoed() {
        let (negotiated, result) = negotiate(&params("2024-11-05", "c"), &ServerConfig::default());
        assert_eq!(negotiated.protocol_version, "2024-11-05");
        assert_eq!(result.protocol_version, "2024-11-05");
    }

    #[test]
    fn test_unknown_version_falls_back_to_latest() {
        let (_, result) = negotiate(&params("1999-01-01", "c"), &ServerConfig::default());
        assert_eq!(result.protocol_version, MCP_VERSION);
    }

    #[test]
    fn test_empty_client_name_rejected() {
        let err = validate_params(&params("2025-06-18", " ")).unwrap_err();
        assert!(matches!(err, McpError::InvalidParams(_)));
    }
}
