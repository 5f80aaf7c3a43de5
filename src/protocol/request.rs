use serde::{Deserialize, Serialize};

/// JSON-RPC 2.0 ID — may be a number or string per spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcId {
    Number(i64),
    Str(String),
}

/// JSON-RPC 2.0 request envelope.
///
/// `jsonrpc` is optional on input; when present it must be `"2.0"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<RpcId>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    /// Build an outgoing request, as the client sends it.
    pub fn new(id: i64, method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: Some("2.0".into()),
            id: Some(RpcId::Number(id)),
            method: method.into(),
            params: Some(params),
        }
    }
}

/// Parameters for `tools/call`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<serde_json::Value>,
}

/// Arguments of the `echo` tool.
#[derive(Debug, Clone, Deserialize)]
pub struct EchoArgs {
    pub text: String,
}

/// Arguments of the `search_files` tool.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchFilesArgs {
    pub pattern: String,
}
