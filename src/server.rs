//! PortMcpServer: rmcp ServerHandler backed by a [`ToolRegistry`].
//!
//! Every session shares one registry, so dynamic action tools are discovered
//! once per process no matter how many clients connect.

use std::sync::Arc;

use rmcp::ErrorData as McpError;
use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Implementation, ListToolsResult,
    PaginatedRequestParams, ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};

use crate::error::PortMcpError;
use crate::registry::ToolRegistry;

/// MCP server exposing the Port tool registry.
///
/// Cheap to clone; `StreamableHttpService` builds one clone per session.
#[derive(Clone)]
pub struct PortMcpServer {
    registry: Arc<ToolRegistry>,
}

impl PortMcpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self::from_shared(Arc::new(registry))
    }

    pub fn from_shared(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }
}

/// Map a dispatch error to its MCP error.
///
/// Caller mistakes become `invalid_params`, with the per-field report as
/// error data for validation failures; everything else is internal.
fn to_mcp_error(error: PortMcpError) -> McpError {
    match &error {
        PortMcpError::Validation { report, .. } => {
            McpError::invalid_params(error.to_string(), Some(report.to_value()))
        }
        PortMcpError::ToolNotFound(_) => McpError::invalid_params(error.to_string(), None),
        _ => McpError::internal_error(error.to_string(), None),
    }
}

impl ServerHandler for PortMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "port-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Port.io tools: read and manage blueprints, entities, scorecards, actions and \
                 permissions, and run self-service actions."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    /// List static tools plus any discovered action tools.
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        self.registry.ensure_dynamic_tools_loaded().await;
        Ok(ListToolsResult {
            tools: self.registry.list_tools().await,
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.registry
            .call_tool(&request.name, request.arguments)
            .await
            .map_err(to_mcp_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, ObjectSchema};
    use crate::testing::MockPort;
    use rmcp::model::ErrorCode;
    use serde_json::json;

    fn make_server() -> PortMcpServer {
        let api: Arc<MockPort> = Arc::new(MockPort::new());
        PortMcpServer::new(ToolRegistry::for_client(api, false))
    }

    #[test]
    fn test_get_info_server_name() {
        let server = make_server();
        let info = server.get_info();
        assert_eq!(info.server_info.name, "port-mcp");
        assert!(
            info.capabilities.tools.is_some(),
            "tools capability should be enabled"
        );
        assert!(info.instructions.is_some());
    }

    #[tokio::test]
    async fn test_clones_share_registry() {
        let server = make_server();
        let clone = server.clone();
        assert!(Arc::ptr_eq(server.registry(), clone.registry()));
        assert!(!server.registry().is_empty().await);
    }

    #[test]
    fn test_validation_error_maps_to_invalid_params() {
        let report = ObjectSchema::new()
            .field(FieldSpec::string("title").required())
            .validate(&serde_json::Map::new())
            .unwrap_err();
        let err = to_mcp_error(PortMcpError::Validation {
            tool: "create_blueprint".into(),
            report,
        });
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert!(err.message.contains("create_blueprint"));
        let data = err.data.unwrap();
        assert_eq!(data["errors"][0]["field"], json!("title"));
        assert_eq!(data["failed_validation"], json!(true));
    }

    #[test]
    fn test_unknown_tool_maps_to_invalid_params() {
        let err = to_mcp_error(PortMcpError::ToolNotFound("nope".into()));
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert!(err.data.is_none());
    }

    #[test]
    fn test_tool_failure_maps_to_internal_error() {
        let err = to_mcp_error(PortMcpError::ToolCall("get_blueprint".into(), "boom".into()));
        assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
        assert!(err.message.contains("boom"));
    }
}
