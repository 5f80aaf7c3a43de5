//! Minimal MCP tool server and matching subprocess client.
//!
//! The server speaks newline-delimited JSON-RPC 2.0 on stdio and exposes two
//! tools, `echo` and `search_files` (bounded regex search under the server's
//! working directory). The client spawns the server as a child process and
//! turns its line-oriented I/O into blocking RPC calls.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod protocol;
pub mod schema;
pub mod search;
pub mod server;
pub mod shell;
pub mod tools;
pub mod transport;
