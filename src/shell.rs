//! Line-oriented front end over [`McpClient`].

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::client::McpClient;
use crate::tools::{echo, search_files};

pub const PROMPT: &str = "agent> ";

pub const HELP: &str = "\
Interactive mode
Commands:
  /echo <text>      - call the echo tool
  /search <regex>   - call the search_files tool
  /tools            - list tools
  /quit             - exit
";

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Empty,
    Quit,
    Tools,
    Echo(String),
    Search(String),
    /// A command missing its argument; carries the hint to print.
    Usage(&'static str),
}

pub fn parse_command(line: &str) -> ShellCommand {
    let line = line.trim();
    if line.is_empty() {
        return ShellCommand::Empty;
    }

    match line {
        "/quit" => return ShellCommand::Quit,
        "/tools" => return ShellCommand::Tools,
        _ => {}
    }

    if let Some(rest) = strip_command(line, "/search") {
        return match rest {
            "" => ShellCommand::Usage("Missing pattern. Example: /search McpClient"),
            pattern => ShellCommand::Search(pattern.to_string()),
        };
    }

    if let Some(rest) = strip_command(line, "/echo") {
        return match rest {
            "" => ShellCommand::Usage("Missing text. Example: /echo hello"),
            text => ShellCommand::Echo(text.to_string()),
        };
    }

    // Free text is routed to echo.
    ShellCommand::Echo(line.to_string())
}

/// `"/cmd"` or `"/cmd <arg>"` → trimmed argument.
fn strip_command<'a>(line: &'a str, command: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(command)?;
    if rest.is_empty() {
        Some(rest)
    } else if rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

/// Concatenate the text blocks of a tool result, or pretty-print the whole
/// result when it has none.
pub fn render_content(result: &Value) -> String {
    let parts: Vec<&str> = result
        .get("content")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter(|item| item.get("type").and_then(Value::as_str) == Some("text"))
                .map(|item| item.get("text").and_then(Value::as_str).unwrap_or(""))
                .collect()
        })
        .unwrap_or_default();

    if parts.is_empty() {
        pretty(result)
    } else {
        parts.join("\n")
    }
}

pub fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Read commands from `input` until `/quit` or end of input.
///
/// Call failures are reported on `output` and the loop carries on.
pub async fn run_shell<R, W>(client: &mut McpClient, input: R, mut output: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    output.write_all(format!("\n{HELP}\n").as_bytes()).await?;

    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            output.write_all(b"\n").await?;
            break;
        };

        let reply = match parse_command(&line) {
            ShellCommand::Empty => continue,
            ShellCommand::Quit => break,
            ShellCommand::Usage(hint) => hint.to_string(),
            ShellCommand::Tools => match client.call("tools/list", None).await {
                Ok(tools) => pretty(&tools),
                Err(e) => format!("error: {e}"),
            },
            ShellCommand::Search(pattern) => {
                call_tool(client, search_files::NAME, json!({ "pattern": pattern })).await
            }
            ShellCommand::Echo(text) => call_tool(client, echo::NAME, json!({ "text": text })).await,
        };

        output.write_all(reply.as_bytes()).await?;
        output.write_all(b"\n").await?;
    }

    output.flush().await
}

async fn call_tool(client: &mut McpClient, name: &str, arguments: Value) -> String {
    let params = json!({ "name": name, "arguments": arguments });
    match client.call("tools/call", Some(params)).await {
        Ok(result) => render_content(&result),
        Err(e) => {
            tracing::debug!(tool = name, "tool call failed: {e}");
            format!("error: {e}")
        }
    }
}
