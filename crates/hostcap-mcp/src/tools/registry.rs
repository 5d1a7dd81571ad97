//! Tool registration and lookup.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::types::ToolDefinition;

use super::Tool;

/// Tools keyed by name, listed in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<IndexMap<String, Arc<Tool>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by name. Returns `true` if a tool was replaced; a
    /// replaced tool keeps its position in the listing.
    pub fn register(&self, tool: Tool) -> bool {
        let name = tool.name().to_string();
        let replaced = self.tools.write().insert(name.clone(), Arc::new(tool));
        tracing::debug!("Registered tool {name} (replaced: {})", replaced.is_some());
        replaced.is_some()
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.tools.write().shift_remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<Arc<Tool>> {
        self.tools.read().get(name).cloned()
    }

    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.tools
            .read()
            .values()
            .map(|t| t.definition().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
