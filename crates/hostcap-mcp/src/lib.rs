//! hostcap MCP server: a Model Context Protocol endpoint that exposes
//! host-registered tools, resources and prompts over JSON-RPC.

pub mod builtin;
pub mod config;
pub mod context;
pub mod logging;
pub mod prompts;
pub mod protocol;
pub mod resources;
pub mod session;
pub mod tools;
pub mod transport;
pub mod types;

pub use config::ServerConfig;
pub use context::RequestContext;
pub use protocol::ProtocolHandler;
pub use transport::{Outbound, StdioTransport};
