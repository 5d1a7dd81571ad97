//! hostcap MCP server: entry point.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use hostcap_mcp::builtin;
use hostcap_mcp::config::ServerConfig;
use hostcap_mcp::protocol::ProtocolHandler;
use hostcap_mcp::transport::{Outbound, StdioTransport};
use hostcap_mcp::types::{ServerCapabilities, MCP_VERSION, SUPPORTED_VERSIONS};

#[derive(Parser)]
#[command(
    name = "hostcap-mcp",
    about = "MCP server exposing host tools, resources and prompts over stdio",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Instructions returned to clients from `initialize`.
    /// Also reads from HOSTCAP_INSTRUCTIONS env var.
    #[arg(long, global = true)]
    instructions: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server over stdio (default).
    Serve {
        /// Seconds to wait for in-flight requests when the client disconnects.
        /// Also reads from HOSTCAP_DRAIN_TIMEOUT_SECS env var.
        #[arg(long)]
        drain_timeout: Option<u64>,
    },

    /// Print server capabilities and builtin catalogue as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   hostcap-mcp completions bash > ~/.local/share/bash-completion/completions/hostcap-mcp
    ///   hostcap-mcp completions zsh > ~/.zfunc/_hostcap-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    // stdout carries protocol traffic.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve { drain_timeout: None }) {
        Commands::Serve { drain_timeout } => {
            let config = ServerConfig::resolve(cli.instructions.as_deref(), drain_timeout);
            tracing::info!("{} {} starting", config.name, config.version);

            let (outbound, outbound_rx) = Outbound::channel();
            let handler = ProtocolHandler::new(config, outbound);
            builtin::install(&handler);

            let transport = StdioTransport::new(handler, outbound_rx);
            transport.run().await?;
        }

        Commands::Info => {
            let config = ServerConfig::resolve(cli.instructions.as_deref(), None);
            let (outbound, _outbound_rx) = Outbound::channel();
            let handler = ProtocolHandler::new(config.clone(), outbound);
            builtin::install(&handler);

            let tools = handler.list_tools();
            let info = serde_json::json!({
                "server": { "name": config.name, "version": config.version },
                "protocol_version": MCP_VERSION,
                "supported_versions": SUPPORTED_VERSIONS,
                "capabilities": ServerCapabilities::default_capabilities(),
                "instructions": config.instructions,
                "tools": tools.iter().map(|t| &t.name).collect::<Vec<_>>(),
                "tool_count": tools.len(),
                "resources": handler.list_resources().iter().map(|r| r.uri.clone()).collect::<Vec<_>>(),
                "resource_templates": handler
                    .list_resource_templates()
                    .iter()
                    .map(|t| t.uri_template.clone())
                    .collect::<Vec<_>>(),
                "prompts": handler.list_prompts().iter().map(|p| p.name.clone()).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "hostcap-mcp", &mut std::io::stdout());
        }
    }

    Ok(())
}
