//! Error types for the Port MCP server.

use thiserror::Error;

use crate::schema::ValidationReport;

/// Main error type for Port MCP operations
#[derive(Error, Debug)]
pub enum PortMcpError {
    /// No tool registered under the requested name
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Arguments failed the tool's input schema
    #[error("invalid input for tool '{tool}': {report}")]
    Validation {
        tool: String,
        report: ValidationReport,
    },

    /// A tool handler failed; carries the original message
    #[error("error calling tool {0}: {1}")]
    ToolCall(String, String),

    /// Port API answered with a non-success status or `ok: false`
    #[error("Port API error {status} on {method} {path}: {message}")]
    Api {
        status: u16,
        method: String,
        path: String,
        message: String,
    },

    /// Request never produced a response (connect, timeout, TLS)
    #[error("transport error: {0}")]
    Transport(String),

    /// Access token could not be obtained
    #[error("authentication with Port failed: {0}")]
    Auth(String),

    /// Response body did not have the expected shape
    #[error("unexpected response from {0}: {1}")]
    UnexpectedResponse(String, String),

    /// Validated arguments could not be bound to the handler's input type
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// A single action could not be turned into a tool
    #[error("failed to build tool for action '{0}': {1}")]
    Synthesis(String, String),

    /// Invalid server configuration
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl PortMcpError {
    /// True for errors caused by the caller's input rather than the server or Port.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PortMcpError::ToolNotFound(_) | PortMcpError::Validation { .. }
        )
    }
}

impl From<reqwest::Error> for PortMcpError {
    fn from(e: reqwest::Error) -> Self {
        PortMcpError::Transport(e.to_string())
    }
}

/// Result type alias for Port MCP operations
pub type Result<T> = std::result::Result<T, PortMcpError>;
