//! mcp-sample-agent - drives an MCP stdio server as a child process.
//!
//! Usage:
//!   mcp-sample-agent                              # spawn the sibling mcp-stdio-tools binary
//!   mcp-sample-agent --cwd ~/src/project          # search a different tree
//!   mcp-sample-agent --server ./other-server -- --flag

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use mcp_stdio_tools::client::McpClient;
use mcp_stdio_tools::config::ClientConfig;
use mcp_stdio_tools::shell::{self, pretty, render_content};
use serde_json::json;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

/// mcp-sample-agent command-line arguments
#[derive(Parser)]
#[command(name = "mcp-sample-agent")]
#[command(about = "Sample agent that talks to an MCP server over stdio")]
#[command(version)]
struct Args {
    /// Server executable (defaults to mcp-stdio-tools next to this binary)
    #[arg(long, env = "MCP_SERVER")]
    server: Option<PathBuf>,

    /// Working directory for the server process
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Seconds to wait for the server to exit on shutdown
    #[arg(long, default_value = "2")]
    shutdown_timeout_secs: u64,

    /// Per-call response timeout in seconds (default: wait indefinitely)
    #[arg(long)]
    call_timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Extra arguments passed to the server
    #[arg(last = true)]
    server_args: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::new(&args.log_level))
        .init();

    let server = match args.server {
        Some(path) => path,
        None => default_server_path()?,
    };

    let mut config = ClientConfig::new(server)
        .shutdown_timeout(Duration::from_secs(args.shutdown_timeout_secs));
    for arg in args.server_args {
        config = config.arg(arg);
    }
    if let Some(dir) = args.cwd {
        config = config.cwd(dir);
    }
    if let Some(secs) = args.call_timeout_secs {
        config = config.call_timeout(Duration::from_secs(secs));
    }

    let mut client = McpClient::open(&config)?;
    let outcome = session(&mut client).await;
    client.close().await;
    outcome
}

async fn session(client: &mut McpClient) -> Result<()> {
    let init = client
        .call(
            "initialize",
            Some(json!({
                "clientInfo": {
                    "name": "mcp-sample-agent",
                    "version": env!("CARGO_PKG_VERSION")
                }
            })),
        )
        .await
        .context("initialize")?;
    println!("Initialized: {}", pretty(&init));

    let tools = client.call("tools/list", None).await.context("tools/list")?;
    println!("\nAvailable tools: {}", pretty(&tools));

    let result = client
        .call(
            "tools/call",
            Some(json!({ "name": "echo", "arguments": { "text": "hello from agent" } })),
        )
        .await
        .context("one-shot echo")?;
    println!("\nOne-shot tool result: {}", render_content(&result));

    let stdin = BufReader::new(tokio::io::stdin());
    shell::run_shell(client, stdin, tokio::io::stdout())
        .await
        .context("interactive shell")?;
    Ok(())
}

fn default_server_path() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("locate current executable")?;
    let dir = exe
        .parent()
        .context("current executable has no parent directory")?;
    Ok(dir.join(format!("mcp-stdio-tools{}", std::env::consts::EXE_SUFFIX)))
}
