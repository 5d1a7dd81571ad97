//! In-flight request tracking for cooperative cancellation.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::types::{McpError, McpResult, RequestId};

struct Entry {
    token: CancellationToken,
    generation: u64,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<RequestId, Entry>,
    next_generation: u64,
}

/// Maps in-flight request ids to their cancellation tokens.
///
/// Entries are inserted through [`track`](Self::track), which hands back a
/// [`PendingGuard`]; dropping the guard removes the entry on every exit path.
/// Each entry carries a generation so that a guard never removes an entry
/// that a later request with a reused id inserted.
#[derive(Default)]
pub struct PendingRequests {
    inner: Mutex<Inner>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` with a fresh token. Fails if `id` is already in flight.
    pub fn track(self: &Arc<Self>, id: RequestId) -> McpResult<PendingGuard> {
        let mut inner = self.inner.lock();
        if inner.entries.contains_key(&id) {
            return Err(McpError::InvalidRequest(format!(
                "Request id {id} is already in flight"
            )));
        }

        inner.next_generation += 1;
        let generation = inner.next_generation;
        let token = CancellationToken::new();
        inner.entries.insert(
            id.clone(),
            Entry {
                token: token.clone(),
                generation,
            },
        );

        Ok(PendingGuard {
            pending: Arc::clone(self),
            id,
            token,
            generation,
        })
    }

    /// Signal and remove the entry for `id`. Returns whether one existed;
    /// cancelling an unknown or already-finished id is a no-op.
    pub fn cancel(&self, id: &RequestId) -> bool {
        let removed = self.inner.lock().entries.remove(id);
        match removed {
            Some(entry) => {
                entry.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Signal every outstanding token and clear the map.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<Entry> = self.inner.lock().entries.drain().map(|(_, e)| e).collect();
        for entry in &drained {
            entry.token.cancel();
        }
        drained.len()
    }

    #[cfg(test)]
    fn contains(&self, id: &RequestId) -> bool {
        self.inner.lock().entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, id: &RequestId, generation: u64) {
        let mut inner = self.inner.lock();
        if inner
            .entries
            .get(id)
            .is_some_and(|e| e.generation == generation)
        {
            inner.entries.remove(id);
        }
    }
}

/// Scoped ownership of one pending entry.
pub struct PendingGuard {
    pending: Arc<PendingRequests>,
    id: RequestId,
    token: CancellationToken,
    generation: u64,
}

impl PendingGuard {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl std::fmt::Debug for PendingGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingGuard")
            .field("id", &self.id)
            .field("generation", &self.generation)
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.pending.release(&self.id, self.generation);
    }
}
