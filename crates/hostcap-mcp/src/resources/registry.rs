//! Resource registration and lookup.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::types::{ResourceDefinition, ResourceTemplateDefinition};

use super::{Resource, ResourceHandlerFn, ResourceRequest, ResourceTemplate};

#[derive(Default)]
struct Inner {
    resources: IndexMap<String, Arc<Resource>>,
    templates: IndexMap<String, Arc<ResourceTemplate>>,
}

/// Static resources keyed by URI plus templates keyed by URI template,
/// behind one lock so a lookup never sees half of a mutation.
#[derive(Default)]
pub struct ResourceRegistry {
    inner: RwLock<Inner>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, resource: Resource) -> bool {
        let uri = resource.uri().to_string();
        let replaced = self.inner.write().resources.insert(uri.clone(), Arc::new(resource));
        tracing::debug!("Registered resource {uri} (replaced: {})", replaced.is_some());
        replaced.is_some()
    }

    pub fn unregister(&self, uri: &str) -> bool {
        self.inner.write().resources.shift_remove(uri).is_some()
    }

    pub fn register_template(&self, template: ResourceTemplate) -> bool {
        let key = template.uri_template().to_string();
        let replaced = self.inner.write().templates.insert(key.clone(), Arc::new(template));
        tracing::debug!("Registered resource template {key} (replaced: {})", replaced.is_some());
        replaced.is_some()
    }

    pub fn unregister_template(&self, uri_template: &str) -> bool {
        self.inner.write().templates.shift_remove(uri_template).is_some()
    }

    pub fn list_resources(&self) -> Vec<ResourceDefinition> {
        self.inner
            .read()
            .resources
            .values()
            .map(|r| r.definition().clone())
            .collect()
    }

    pub fn list_templates(&self) -> Vec<ResourceTemplateDefinition> {
        self.inner
            .read()
            .templates
            .values()
            .map(|t| t.definition().clone())
            .collect()
    }

    /// Find the handler for `uri`: exact static match first, then templates
    /// in registration order.
    pub fn resolve(&self, uri: &str) -> Option<(ResourceHandlerFn, ResourceRequest)> {
        let inner = self.inner.read();

        if let Some(resource) = inner.resources.get(uri) {
            return Some((
                Arc::clone(resource.handler()),
                ResourceRequest {
                    uri: uri.to_string(),
                    params: Default::default(),
                },
            ));
        }

        inner.templates.values().find_map(|template| {
            template.matches(uri).map(|params| {
                (
                    Arc::clone(template.handler()),
                    ResourceRequest {
                        uri: uri.to_string(),
                        params,
                    },
                )
            })
        })
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read();
        inner.resources.len() + inner.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
