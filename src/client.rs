//! Subprocess-driving JSON-RPC client.
//!
//! The client owns the child's standard streams and issues one request at a
//! time: `call` writes a frame and blocks until exactly one response line
//! comes back. It does not compare response ids; strict request/response
//! alternation on a private pipe is what keeps calls correlated. Share a
//! client across tasks only behind a mutex.

use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;

use crate::config::ClientConfig;
use crate::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::transport::{self, Frame};

/// Most recent bytes of child stderr kept for diagnostics (64 KiB).
const STDERR_CAPTURE_LIMIT: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to spawn MCP server `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    /// The server's output closed (or its input broke) before a response arrived.
    #[error("No response from MCP server. stderr: {stderr}")]
    Transport { stderr: String },
    /// The server answered with an `error` object.
    #[error("MCP error {code}: {message}")]
    Protocol { code: i32, message: String },
    #[error("malformed response from MCP server: {0}")]
    Decode(String),
    #[error("no response from MCP server within {0:?}")]
    Timeout(Duration),
    #[error("MCP server streams are not available")]
    Closed,
}

/// Handle to a running server process.
///
/// The child is spawned with `kill_on_drop`, so dropping the handle on any
/// path terminates it; [`McpClient::close`] is the orderly way out.
pub struct McpClient {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    stderr: Arc<Mutex<String>>,
    stderr_task: Option<JoinHandle<()>>,
    next_id: i64,
    line: Vec<u8>,
    shutdown_timeout: Duration,
    call_timeout: Option<Duration>,
}

impl McpClient {
    /// Spawn the server described by `config` with all three streams piped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .envs(config.env.iter().cloned())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &config.cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| ClientError::Spawn {
            command: config.command.to_string_lossy().into_owned(),
            source,
        })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().ok_or(ClientError::Closed)?;

        let stderr = Arc::new(Mutex::new(String::new()));
        let stderr_task = child
            .stderr
            .take()
            .map(|pipe| tokio::spawn(drain_stderr(pipe, Arc::clone(&stderr))));

        tracing::debug!(pid = ?child.id(), "spawned MCP server");

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            stderr,
            stderr_task,
            next_id: 1,
            line: Vec::new(),
            shutdown_timeout: config.shutdown_timeout,
            call_timeout: config.call_timeout,
        })
    }

    /// Id the next call will use. Starts at 1 and never repeats.
    pub fn next_id(&self) -> i64 {
        self.next_id
    }

    /// Everything the server has written to stderr so far (bounded).
    pub fn captured_stderr(&self) -> String {
        self.stderr.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Send `method` with `params` (default `{}`) and return the response's
    /// `result`.
    ///
    /// The id is consumed whether or not the call succeeds. If a call timeout
    /// is configured and elapses, the client is left closed: a late response
    /// would otherwise be read as the answer to the next call.
    pub async fn call(&mut self, method: &str, params: Option<Value>) -> Result<Value, ClientError> {
        let id = self.next_id;
        self.next_id += 1;

        let request = JsonRpcRequest::new(id, method, params.unwrap_or_else(|| json!({})));

        let response = match self.call_timeout {
            Some(limit) => {
                let outcome = tokio::time::timeout(limit, self.exchange(&request)).await;
                match outcome {
                    Ok(outcome) => outcome?,
                    Err(_) => {
                        tracing::warn!(id, method, "call timed out after {limit:?}");
                        self.stdin = None;
                        return Err(ClientError::Timeout(limit));
                    }
                }
            }
            None => self.exchange(&request).await?,
        };

        response
            .into_outcome()
            .map_err(|err| ClientError::Protocol {
                code: err.code,
                message: err.message,
            })
    }

    async fn exchange(&mut self, request: &JsonRpcRequest) -> Result<JsonRpcResponse, ClientError> {
        let written = match self.stdin.as_mut() {
            Some(stdin) => transport::write_frame(stdin, request).await,
            None => return Err(ClientError::Closed),
        };
        if let Err(e) = written {
            tracing::debug!("write to MCP server failed: {e}");
            return Err(self.transport_error().await);
        }

        loop {
            match transport::read_frame(&mut self.stdout, &mut self.line).await {
                Ok(Frame::Message(value)) => {
                    return serde_json::from_value(value)
                        .map_err(|e| ClientError::Decode(e.to_string()));
                }
                Ok(Frame::Blank) => continue,
                Ok(Frame::Malformed(reason)) => return Err(ClientError::Decode(reason)),
                Ok(Frame::Eof) => return Err(self.transport_error().await),
                Err(e) => {
                    tracing::debug!("read from MCP server failed: {e}");
                    return Err(self.transport_error().await);
                }
            }
        }
    }

    /// Build a transport error once the stderr drain has caught up.
    async fn transport_error(&mut self) -> ClientError {
        if let Some(task) = self.stderr_task.take() {
            let _ = tokio::time::timeout(self.shutdown_timeout, task).await;
        }
        ClientError::Transport {
            stderr: self.captured_stderr(),
        }
    }

    /// Close the server's input, wait up to the shutdown timeout for it to
    /// exit, then kill it. Never fails; an already-exited child is fine.
    pub async fn close(mut self) {
        drop(self.stdin.take());

        match tokio::time::timeout(self.shutdown_timeout, self.child.wait()).await {
            Ok(Ok(status)) => tracing::debug!(%status, "MCP server exited"),
            Ok(Err(e)) => {
                tracing::warn!("waiting for MCP server failed: {e}");
                let _ = self.child.start_kill();
            }
            Err(_) => {
                tracing::warn!(
                    "MCP server did not exit within {:?}, killing it",
                    self.shutdown_timeout
                );
                if let Err(e) = self.child.kill().await {
                    tracing::warn!("failed to kill MCP server: {e}");
                }
            }
        }

        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }
    }
}

async fn drain_stderr(mut pipe: ChildStderr, sink: Arc<Mutex<String>>) {
    let mut chunk = [0u8; 4096];
    loop {
        let n = match pipe.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        let Ok(mut text) = sink.lock() else { return };
        text.push_str(&String::from_utf8_lossy(&chunk[..n]));
        if text.len() > STDERR_CAPTURE_LIMIT {
            let mut cut = text.len() - STDERR_CAPTURE_LIMIT;
            while !text.is_char_boundary(cut) {
                cut += 1;
            }
            text.drain(..cut);
        }
    }
}
