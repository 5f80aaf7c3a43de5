use serde_json::json;

use crate::protocol::{EchoArgs, ToolResult};

use super::ToolDescriptor;

pub const NAME: &str = "echo";

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: NAME,
        description: "Returns the same text you provide.",
        input_schema: json!({
            "type": "object",
            "required": ["text"],
            "properties": {
                "text": {
                    "type": "string",
                    "description": "Text to echo."
                }
            }
        }),
    }
}

/// Handle an `echo` tool call.
pub fn handle(args: EchoArgs) -> ToolResult {
    ToolResult::text(format!("Echo from MCP server: {}", args.text))
}
