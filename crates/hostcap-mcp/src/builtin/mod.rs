//! Demo handlers the binary installs on every connection.

pub mod countdown;
pub mod current_time;
pub mod echo;
pub mod echo_resource;
pub mod server_info;
pub mod summarize;

use crate::prompts::Prompt;
use crate::protocol::ProtocolHandler;
use crate::resources::{Resource, ResourceTemplate};
use crate::tools::Tool;
use crate::types::McpError;

/// Register every builtin tool, resource, template and prompt.
pub fn install(handler: &ProtocolHandler) {
    handler.register_tool(Tool::new(echo::definition(), echo::execute));
    handler.register_tool(Tool::new(current_time::definition(), current_time::execute));
    handler.register_tool(Tool::new(countdown::definition(), countdown::execute));

    let config = handler.config().clone();
    let started_at = chrono::Utc::now().to_rfc3339();
    handler.register_resource(Resource::new(
        server_info::definition(),
        move |_request, _ctx| {
            let content = server_info::read(&config, &started_at);
            async move { Ok::<_, McpError>(content) }
        },
    ));

    handler.register_resource_template(ResourceTemplate::new(
        echo_resource::definition(),
        |request, _ctx| {
            let content = echo_resource::read(&request);
            async move { content }
        },
    ));

    handler.register_prompt(Prompt::new(summarize::definition(), summarize::expand));

    tracing::debug!(
        "Installed {} builtin tools, {} resources, {} prompts",
        handler.list_tools().len(),
        handler.list_resources().len() + handler.list_resource_templates().len(),
        handler.list_prompts().len()
    );
}
