//! Resource and resource-template registration records.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::context::{BoxFuture, RequestContext};
use crate::types::{McpResult, ResourceContent, ResourceDefinition, ResourceTemplateDefinition};

use super::template::UriTemplate;

/// A resolved read: the URI the client asked for plus any variables a
/// template captured from it (empty for static resources).
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    pub uri: String,
    pub params: HashMap<String, String>,
}

pub type ResourceFuture = BoxFuture<'static, McpResult<ResourceContent>>;

pub type ResourceHandlerFn =
    Arc<dyn Fn(ResourceRequest, RequestContext) -> ResourceFuture + Send + Sync>;

fn boxed<F, Fut>(handler: F) -> ResourceHandlerFn
where
    F: Fn(ResourceRequest, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = McpResult<ResourceContent>> + Send + 'static,
{
    Arc::new(
        move |req: ResourceRequest, ctx: RequestContext| -> ResourceFuture {
            Box::pin(handler(req, ctx))
        },
    )
}

/// A static resource addressed by exact URI.
#[derive(Clone)]
pub struct Resource {
    definition: ResourceDefinition,
    handler: ResourceHandlerFn,
}

impl Resource {
    pub fn new<F, Fut>(definition: ResourceDefinition, handler: F) -> Self
    where
        F: Fn(ResourceRequest, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = McpResult<ResourceContent>> + Send + 'static,
    {
        Self {
            definition,
            handler: boxed(handler),
        }
    }

    pub fn uri(&self) -> &str {
        &self.definition.uri
    }

    pub fn definition(&self) -> &ResourceDefinition {
        &self.definition
    }

    pub fn handler(&self) -> &ResourceHandlerFn {
        &self.handler
    }
}

/// A family of resources matched by URI template.
#[derive(Clone)]
pub struct ResourceTemplate {
    definition: ResourceTemplateDefinition,
    matcher: UriTemplate,
    handler: ResourceHandlerFn,
}

impl ResourceTemplate {
    pub fn new<F, Fut>(definition: ResourceTemplateDefinition, handler: F) -> Self
    where
        F: Fn(ResourceRequest, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = McpResult<ResourceContent>> + Send + 'static,
    {
        Self {
            matcher: UriTemplate::new(&definition.uri_template),
            definition,
            handler: boxed(handler),
        }
    }

    pub fn uri_template(&self) -> &str {
        &self.definition.uri_template
    }

    pub fn definition(&self) -> &ResourceTemplateDefinition {
        &self.definition
    }

    pub fn matches(&self, uri: &str) -> Option<HashMap<String, String>> {
        self.matcher.matches(uri)
    }

    pub fn handler(&self) -> &ResourceHandlerFn {
        &self.handler
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("uri", &self.definition.uri)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for ResourceTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceTemplate")
            .field("uri_template", &self.definition.uri_template)
            .finish_non_exhaustive()
    }
}
