//! Fixed tool table: `echo` and `search_files`.

pub mod echo;
pub mod search_files;

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::config::ServerConfig;
use crate::protocol::{EchoArgs, JsonRpcError, SearchFilesArgs, ToolResult};
use crate::schema;

/// Name, description and input schema of a tool, as advertised by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(String),
    #[error("{0}")]
    Internal(String),
}

impl ToolError {
    /// Map to the corresponding JSON-RPC 2.0 error code.
    ///
    /// Caller mistakes → -32602 (Invalid params)
    /// Server-side failures → -32603 (Internal error)
    pub fn json_rpc_code(&self) -> i32 {
        match self {
            Self::UnknownTool(_) | Self::InvalidArgument(_) | Self::InvalidPattern(_) => {
                JsonRpcError::INVALID_PARAMS
            }
            Self::Internal(_) => JsonRpcError::INTERNAL_ERROR,
        }
    }
}

impl From<ToolError> for JsonRpcError {
    fn from(err: ToolError) -> Self {
        JsonRpcError::new(err.json_rpc_code(), err.to_string())
    }
}

/// Tool table built once at server start; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
    search_root: PathBuf,
    tool_timeout: Duration,
}

impl ToolRegistry {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            tools: vec![echo::descriptor(), search_files::descriptor()],
            search_root: config.search_root.clone(),
            tool_timeout: config.tool_timeout,
        }
    }

    /// Descriptors in registration order: `echo`, then `search_files`.
    pub fn list(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Invoke a tool by name.
    ///
    /// `arguments` is validated against the tool's input schema before the
    /// tool runs; a violation is reported as [`ToolError::InvalidArgument`].
    pub async fn invoke(&self, name: &str, arguments: &Value) -> Result<ToolResult, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        schema::validate_value(&tool.input_schema, arguments).map_err(|e| {
            ToolError::InvalidArgument(format!("Invalid arguments for {name}: {e}"))
        })?;

        match tool.name {
            echo::NAME => {
                let args: EchoArgs = parse_args(name, arguments)?;
                Ok(echo::handle(args))
            }
            search_files::NAME => {
                let args: SearchFilesArgs = parse_args(name, arguments)?;
                search_files::handle(args, self.search_root.clone(), self.tool_timeout).await
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(name: &str, arguments: &Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments.clone())
        .map_err(|e| ToolError::InvalidArgument(format!("Invalid arguments for {name}: {e}")))
}
