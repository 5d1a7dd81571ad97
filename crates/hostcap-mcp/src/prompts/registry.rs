//! Prompt registration and lookup.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::types::PromptDefinition;

use super::Prompt;

#[derive(Default)]
pub struct PromptRegistry {
    prompts: RwLock<IndexMap<String, Arc<Prompt>>>,
}

impl PromptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, prompt: Prompt) -> bool {
        let name = prompt.name().to_string();
        let replaced = self.prompts.write().insert(name.clone(), Arc::new(prompt));
        tracing::debug!("Registered prompt {name} (replaced: {})", replaced.is_some());
        replaced.is_some()
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.prompts.write().shift_remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<Arc<Prompt>> {
        self.prompts.read().get(name).cloned()
    }

    pub fn list_prompts(&self) -> Vec<PromptDefinition> {
        self.prompts
            .read()
            .values()
            .map(|p| p.definition().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.prompts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
