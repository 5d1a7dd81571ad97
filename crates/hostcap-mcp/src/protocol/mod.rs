//! MCP protocol handling: lifecycle, JSON-RPC dispatch and cancellation.

pub mod handler;
pub mod method;
pub mod negotiation;
pub mod pending;
pub mod validator;

pub use handler::ProtocolHandler;
pub use method::{NotificationMethod, RequestMethod};
pub use pending::{PendingGuard, PendingRequests};
