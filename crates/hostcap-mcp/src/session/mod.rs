//! Per-connection session state and lifecycle phases.

pub mod state;

pub use state::{Phase, Session};
