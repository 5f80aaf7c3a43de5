pub mod request;
pub mod response;

pub use request::{EchoArgs, JsonRpcRequest, RpcId, SearchFilesArgs, ToolCallParams};
pub use response::{JsonRpcError, JsonRpcResponse, ToolResult, ToolResultContent};

/// JSON-RPC protocol version carried on every frame.
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol revision reported by `initialize`.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
