//! Validated dispatch: check arguments, run the handler, serialize the result.

use rmcp::model::{CallToolResult, Content};
use serde_json::Value;

use crate::error::PortMcpError;
use crate::schema::JsonObject;
use crate::tool::ToolDescriptor;

/// Execute `tool` with raw call arguments.
///
/// Validation failures come back as [`PortMcpError::Validation`] and the
/// handler never runs. Handler failures are logged with the arguments and
/// returned as [`PortMcpError::ToolCall`]. On success the handler's output is
/// serialized to a single text content item and, when it is an object, also
/// returned as structured content. Output that misses the declared output
/// schema is logged, not rejected.
pub async fn execute_tool(
    tool: &ToolDescriptor,
    arguments: Option<JsonObject>,
) -> crate::Result<CallToolResult> {
    let name = tool.name();
    let arguments = arguments.unwrap_or_default();
    tracing::info!(tool = %name, "calling tool");
    tracing::debug!(tool = %name, arguments = ?arguments, "tool arguments");

    let validated = match tool.validate_input(&arguments) {
        Ok(validated) => validated,
        Err(e) => {
            tracing::warn!(tool = %name, error = %e, "tool arguments rejected");
            return Err(e);
        }
    };

    let output = match tool.invoke(validated).await {
        Ok(output) => output,
        Err(e) => {
            tracing::error!(tool = %name, arguments = ?arguments, error = %e, "tool call failed");
            return Err(PortMcpError::ToolCall(name.to_string(), e.to_string()));
        }
    };

    check_output(tool, &output);
    let text = serde_json::to_string(&output)
        .map_err(|e| PortMcpError::ToolCall(name.to_string(), e.to_string()))?;
    tracing::debug!(tool = %name, bytes = text.len(), "tool call succeeded");

    Ok(CallToolResult {
        content: vec![Content::text(text)],
        is_error: Some(false),
        structured_content: output.is_object().then_some(output),
        meta: None,
    })
}

/// Warn when a handler's output does not match its declared output schema.
fn check_output(tool: &ToolDescriptor, output: &Value) {
    let Some(object) = output.as_object() else {
        tracing::warn!(tool = %tool.name(), "tool output is not a JSON object");
        return;
    };
    if let Err(report) = tool.output_schema().validate(object) {
        tracing::warn!(
            tool = %tool.name(),
            fields = ?report.fields(),
            "tool output does not match its output schema"
        );
    }
}
