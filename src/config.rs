use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

/// Default timeout for tool operations (30 seconds).
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 30;

/// Default grace period for the child process to exit on close (2 seconds).
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 2;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("MCP_TOOL_TIMEOUT_SECS must be a positive integer")]
    InvalidToolTimeout,
    #[error("cannot determine current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub search_root: PathBuf,
    pub tool_timeout: Duration,
}

impl ServerConfig {
    /// Configuration rooted at `search_root` with default limits.
    pub fn new(search_root: impl Into<PathBuf>) -> Self {
        Self {
            search_root: search_root.into(),
            tool_timeout: Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS),
        }
    }

    /// Load configuration from environment.
    ///
    /// - `MCP_SEARCH_ROOT` (optional, default: current directory) — root for `search_files`
    /// - `MCP_TOOL_TIMEOUT_SECS` (optional, default 30) — max seconds per tool call
    pub fn from_env() -> Result<Self, ConfigError> {
        let search_root = match std::env::var_os("MCP_SEARCH_ROOT") {
            Some(root) => PathBuf::from(root),
            None => std::env::current_dir().map_err(ConfigError::CurrentDir)?,
        };

        let tool_timeout_secs = match std::env::var("MCP_TOOL_TIMEOUT_SECS") {
            Ok(val) => match val.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => return Err(ConfigError::InvalidToolTimeout),
            },
            Err(_) => DEFAULT_TOOL_TIMEOUT_SECS,
        };

        Ok(Self {
            search_root,
            tool_timeout: Duration::from_secs(tool_timeout_secs),
        })
    }
}

/// How the client launches and tears down the server process.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub command: OsString,
    pub args: Vec<OsString>,
    pub env: Vec<(OsString, OsString)>,
    pub cwd: Option<PathBuf>,
    pub shutdown_timeout: Duration,
    /// `None` blocks each call until a response line or stream closure.
    pub call_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(command: impl Into<OsString>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            call_timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }
}
