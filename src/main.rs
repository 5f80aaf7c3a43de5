use mcp_stdio_tools::config::ServerConfig;
use mcp_stdio_tools::server::McpServer;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Standard output carries frames; diagnostics go to standard error only.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env("MCP_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let config = match ServerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("mcp-stdio-tools: configuration error: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(root = %config.search_root.display(), "starting server");

    let server = McpServer::new(config);
    if let Err(e) = server.run().await {
        eprintln!("mcp-stdio-tools: fatal error: {e}");
        std::process::exit(1);
    }
}
