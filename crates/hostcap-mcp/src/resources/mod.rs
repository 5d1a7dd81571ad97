//! Resource registry: readable host resources, static and templated.

pub mod registry;
pub mod resource;
pub mod template;

pub use registry::ResourceRegistry;
pub use resource::{
    Resource, ResourceFuture, ResourceHandlerFn, ResourceRequest, ResourceTemplate,
};
pub use template::UriTemplate;
