//! Connection state: lifecycle phase, peer identity, negotiated capabilities
//! and resource subscriptions.

use std::collections::HashSet;

use crate::protocol::negotiation::NegotiatedCapabilities;
use crate::types::{Implementation, McpError, McpResult};

/// Lifecycle phase of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Initializing,
    Ready,
    Shutdown,
}

/// Per-connection protocol state.
#[derive(Debug)]
pub struct Session {
    phase: Phase,
    peer: Option<Implementation>,
    negotiated: Option<NegotiatedCapabilities>,
    subscriptions: HashSet<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: Phase::Uninitialized,
            peer: None,
            negotiated: None,
            subscriptions: HashSet::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn peer(&self) -> Option<&Implementation> {
        self.peer.as_ref()
    }

    pub fn negotiated(&self) -> Option<&NegotiatedCapabilities> {
        self.negotiated.as_ref()
    }

    /// Fails unless an `initialize` request may still be accepted.
    pub fn ensure_uninitialized(&self) -> McpResult<()> {
        match self.phase {
            Phase::Uninitialized => Ok(()),
            Phase::Initializing | Phase::Ready => Err(McpError::AlreadyInitialized),
            Phase::Shutdown => Err(McpError::ShuttingDown),
        }
    }

    /// `uninitialized -> initializing`. Peer info is written exactly once.
    pub fn begin(
        &mut self,
        peer: Implementation,
        negotiated: NegotiatedCapabilities,
    ) -> McpResult<()> {
        self.ensure_uninitialized()?;
        self.peer = Some(peer);
        self.negotiated = Some(negotiated);
        self.phase = Phase::Initializing;
        Ok(())
    }

    /// `initializing -> ready`. Returns `false` if the session was not
    /// waiting for the handshake to complete.
    pub fn mark_ready(&mut self) -> bool {
        if self.phase != Phase::Initializing {
            return false;
        }
        self.phase = Phase::Ready;
        true
    }

    /// Move to the terminal phase. Returns `false` if already there.
    pub fn shut_down(&mut self) -> bool {
        if self.phase == Phase::Shutdown {
            return false;
        }
        self.phase = Phase::Shutdown;
        self.subscriptions.clear();
        true
    }

    /// Guard for capability operations.
    pub fn ensure_ready(&self) -> McpResult<()> {
        match self.phase {
            Phase::Ready => Ok(()),
            Phase::Uninitialized | Phase::Initializing => Err(McpError::NotInitialized),
            Phase::Shutdown => Err(McpError::ShuttingDown),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    pub fn subscribe(&mut self, uri: &str) -> bool {
        self.subscriptions.insert(uri.to_string())
    }

    pub fn unsubscribe(&mut self, uri: &str) -> bool {
        self.subscriptions.remove(uri)
    }

    pub fn is_subscribed(&self, uri: &str) -> bool {
        self.subscriptions.contains(uri)
    }
}
