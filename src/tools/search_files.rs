use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::protocol::{SearchFilesArgs, ToolResult};
use crate::search::{self, Match, SearchError};

use super::{ToolDescriptor, ToolError};

pub const NAME: &str = "search_files";

/// Rendered when a search completes without any match.
pub const NO_MATCHES: &str = "No matches found.";

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: NAME,
        description: "Searches text files in the current directory with a regex.",
        input_schema: json!({
            "type": "object",
            "required": ["pattern"],
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Regex pattern to search for."
                }
            }
        }),
    }
}

/// Handle a `search_files` tool call.
///
/// The walk runs on a blocking thread and is bounded by `timeout`; when the
/// limit fires the walk is told to stop so it does not outlive the call.
pub async fn handle(
    args: SearchFilesArgs,
    root: PathBuf,
    timeout: Duration,
) -> Result<ToolResult, ToolError> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    let task = tokio::task::spawn_blocking(move || {
        search::search_until(&args.pattern, &root, &flag)
    });

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(Ok(matches))) => Ok(ToolResult::text(render(&matches))),
        Ok(Ok(Err(SearchError::InvalidPattern(e)))) => Err(ToolError::InvalidPattern(e.to_string())),
        Ok(Err(join_err)) => {
            tracing::error!("search task join error: {join_err}");
            Err(ToolError::Internal("search task failed".into()))
        }
        Err(_) => {
            cancel.store(true, Ordering::Relaxed);
            tracing::warn!("search timed out after {} seconds", timeout.as_secs());
            Err(ToolError::Internal(format!(
                "search timed out after {} seconds",
                timeout.as_secs()
            )))
        }
    }
}

/// One `path:line: snippet` line per match, or [`NO_MATCHES`].
pub fn render(matches: &[Match]) -> String {
    if matches.is_empty() {
        return NO_MATCHES.to_string();
    }
    matches
        .iter()
        .map(Match::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
