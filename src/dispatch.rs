//! Routes one decoded request to a response.
//!
//! Failures never escape as Rust errors: every outcome is a
//! [`JsonRpcResponse`] carrying the originating id (or `null`).

use serde::Serialize;
use serde_json::{json, Value};

use crate::protocol::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcId, ToolCallParams, JSONRPC_VERSION,
    MCP_PROTOCOL_VERSION,
};
use crate::tools::ToolRegistry;

/// Server name reported by `initialize`.
pub const SERVER_NAME: &str = "mcp-stdio-tools";

/// Methods the server understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Initialize,
    Initialized,
    Ping,
    ToolsList,
    ToolsCall,
}

impl Method {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "initialize" => Some(Self::Initialize),
            "notifications/initialized" => Some(Self::Initialized),
            "ping" => Some(Self::Ping),
            "tools/list" => Some(Self::ToolsList),
            "tools/call" => Some(Self::ToolsCall),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Initialized => "notifications/initialized",
            Self::Ping => "ping",
            Self::ToolsList => "tools/list",
            Self::ToolsCall => "tools/call",
        }
    }
}

/// Dispatch a decoded JSON value.
///
/// Returns `None` only for an id-less `notifications/initialized`.
pub async fn dispatch(message: Value, registry: &ToolRegistry) -> Option<JsonRpcResponse> {
    match decode_request(message) {
        Ok(req) => dispatch_request(&req, registry).await,
        Err(resp) => Some(resp),
    }
}

/// Dispatch an already-typed request.
pub async fn dispatch_request(
    req: &JsonRpcRequest,
    registry: &ToolRegistry,
) -> Option<JsonRpcResponse> {
    let id = req.id.clone();

    let method = match Method::parse(&req.method) {
        Some(m) => m,
        None => {
            return Some(JsonRpcResponse::error(
                id,
                JsonRpcError::method_not_found(&req.method),
            ))
        }
    };

    match method {
        Method::Initialize => {
            let result = json!({
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION")
                }
            });
            Some(JsonRpcResponse::success(id, result))
        }

        Method::Initialized => id.map(|id| JsonRpcResponse::success(Some(id), json!({}))),

        Method::Ping => Some(JsonRpcResponse::success(id, json!({}))),

        Method::ToolsList => {
            #[derive(Serialize)]
            struct ToolsList<'a> {
                tools: &'a [crate::tools::ToolDescriptor],
            }
            Some(respond_with(id, &ToolsList { tools: registry.list() }))
        }

        Method::ToolsCall => {
            let params: ToolCallParams = match &req.params {
                Some(v) => match serde_json::from_value(v.clone()) {
                    Ok(p) => p,
                    Err(e) => {
                        return Some(JsonRpcResponse::error(
                            id,
                            JsonRpcError::invalid_params(format!(
                                "Invalid tools/call params: {e}"
                            )),
                        ));
                    }
                },
                None => {
                    return Some(JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_params("Missing params for tools/call"),
                    ));
                }
            };

            let arguments = match params.arguments {
                Some(Value::Null) | None => json!({}),
                Some(v) => v,
            };

            match registry.invoke(&params.name, &arguments).await {
                Ok(tool_result) => Some(respond_with(id, &tool_result)),
                Err(err) => {
                    tracing::debug!(tool = %params.name, "tool call rejected: {err}");
                    Some(JsonRpcResponse::error(id, err.into()))
                }
            }
        }
    }
}

/// Turn a raw JSON value into a request, or the error response it earns.
fn decode_request(message: Value) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let id = message
        .get("id")
        .and_then(|v| serde_json::from_value::<RpcId>(v.clone()).ok());

    let req: JsonRpcRequest = serde_json::from_value(message).map_err(|e| {
        tracing::warn!("invalid request envelope: {e}");
        JsonRpcResponse::error(id.clone(), JsonRpcError::invalid_request())
    })?;

    if let Some(version) = &req.jsonrpc {
        if version != JSONRPC_VERSION {
            return Err(JsonRpcResponse::error(
                req.id.clone(),
                JsonRpcError::invalid_request_with(format!(
                    "Unsupported jsonrpc version: {version}"
                )),
            ));
        }
    }

    Ok(req)
}

fn respond_with<T: Serialize>(id: Option<RpcId>, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => {
            tracing::error!("serialization failed: {e}");
            JsonRpcResponse::error(id, JsonRpcError::internal_error("Serialization failed"))
        }
    }
}
