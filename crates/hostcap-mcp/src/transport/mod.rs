//! Transport layer for MCP communication.

pub mod framing;
pub mod outbound;
pub mod stdio;

pub use outbound::{Outbound, OutboundReceiver};
pub use stdio::StdioTransport;
