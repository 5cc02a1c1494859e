//! Tool descriptors: a named, described unit pairing an input schema, an
//! output schema, a handler and side-effect annotations.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use rmcp::model::{Tool, ToolAnnotations};
use serde_json::Value;

use crate::error::PortMcpError;
use crate::schema::{JsonObject, ObjectSchema, ValidatedArgs};

/// Future returned by every tool handler.
pub type HandlerFuture = BoxFuture<'static, crate::Result<Value>>;

/// The callable part of a tool.
///
/// Implemented for plain closures `Fn(ValidatedArgs) -> HandlerFuture`, and by
/// dedicated structs where the handler carries its own state (see
/// [`crate::dynamic::ActionRunHandler`]).
pub trait ToolHandler: Send + Sync {
    fn call(&self, args: ValidatedArgs) -> HandlerFuture;
}

impl<F> ToolHandler for F
where
    F: Fn(ValidatedArgs) -> HandlerFuture + Send + Sync,
{
    fn call(&self, args: ValidatedArgs) -> HandlerFuture {
        self(args)
    }
}

/// Advisory side-effect hints surfaced to calling agents. Never enforced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotations {
    pub title: String,
    pub read_only: bool,
    pub destructive: bool,
    pub idempotent: bool,
    pub open_world: bool,
}

impl Annotations {
    /// Reads that never change Port state.
    pub fn read_only(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            read_only: true,
            destructive: false,
            idempotent: true,
            open_world: false,
        }
    }

    /// Creates and updates.
    pub fn write(title: impl Into<String>, idempotent: bool) -> Self {
        Self {
            title: title.into(),
            read_only: false,
            destructive: false,
            idempotent,
            open_world: false,
        }
    }

    /// Deletes.
    pub fn destructive(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            read_only: false,
            destructive: true,
            idempotent: true,
            open_world: false,
        }
    }

    pub fn open_world(mut self) -> Self {
        self.open_world = true;
        self
    }

    fn to_mcp(&self) -> ToolAnnotations {
        ToolAnnotations {
            title: Some(self.title.clone()),
            read_only_hint: Some(self.read_only),
            destructive_hint: Some(self.destructive),
            idempotent_hint: Some(self.idempotent),
            open_world_hint: Some(self.open_world),
        }
    }
}

/// A fully built, immutable tool.
#[derive(Clone)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    input_schema: ObjectSchema,
    output_schema: ObjectSchema,
    handler: Arc<dyn ToolHandler>,
    annotations: Annotations,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: ObjectSchema,
        output_schema: ObjectSchema,
        annotations: Annotations,
        handler: impl ToolHandler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            output_schema,
            handler: Arc::new(handler),
            annotations,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input_schema(&self) -> &ObjectSchema {
        &self.input_schema
    }

    pub fn output_schema(&self) -> &ObjectSchema {
        &self.output_schema
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Validate raw call arguments against the input schema.
    pub fn validate_input(&self, raw: &JsonObject) -> crate::Result<ValidatedArgs> {
        self.input_schema
            .validate(raw)
            .map_err(|report| PortMcpError::Validation {
                tool: self.name.clone(),
                report,
            })
    }

    /// Run the handler on already-validated arguments.
    pub fn invoke(&self, args: ValidatedArgs) -> HandlerFuture {
        self.handler.call(args)
    }

    /// MCP `tools/list` entry: name, description, inlined input and output
    /// schemas, annotations.
    pub fn to_mcp_tool(&self) -> Tool {
        Tool {
            name: self.name.clone().into(),
            title: Some(self.annotations.title.clone()),
            description: Some(self.description.clone().into()),
            input_schema: Arc::new(self.input_schema.to_json_schema()),
            output_schema: Some(Arc::new(self.output_schema.to_json_schema())),
            annotations: Some(self.annotations.to_mcp()),
            icons: None,
            meta: None,
        }
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("annotations", &self.annotations)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;
    use serde_json::json;

    fn echo_tool() -> ToolDescriptor {
        ToolDescriptor::new(
            "get_blueprint",
            "Get a blueprint",
            ObjectSchema::new().field(FieldSpec::string("blueprint_identifier").required()),
            ObjectSchema::new()
                .field(FieldSpec::string("blueprint_identifier").required())
                .allow_additional(),
            Annotations::read_only("Get Blueprint"),
            |args: ValidatedArgs| -> HandlerFuture {
                Box::pin(async move { Ok(Value::Object(args.into_map())) })
            },
        )
    }

    #[test]
    fn test_validate_input_wraps_report() {
        let tool = echo_tool();
        let err = tool.validate_input(&JsonObject::new()).unwrap_err();
        assert!(
            matches!(&err, PortMcpError::Validation { tool, report }
                if tool == "get_blueprint" && report.fields() == vec!["blueprint_identifier"])
        );
    }

    #[tokio::test]
    async fn test_invoke_runs_handler() {
        let tool = echo_tool();
        let raw = json!({"blueprint_identifier": "service"});
        let args = tool.validate_input(raw.as_object().unwrap()).unwrap();
        let out = tool.invoke(args).await.unwrap();
        assert_eq!(out, raw);
    }

    #[test]
    fn test_to_mcp_tool() {
        let mcp = echo_tool().to_mcp_tool();
        assert_eq!(mcp.name.as_ref(), "get_blueprint");
        assert_eq!(mcp.description.as_deref(), Some("Get a blueprint"));
        assert_eq!(mcp.input_schema["required"], json!(["blueprint_identifier"]));
        let output = mcp.output_schema.unwrap();
        assert_eq!(output["type"], json!("object"));
        assert_eq!(output["additionalProperties"], json!(true));
        let annotations = mcp.annotations.unwrap();
        assert_eq!(annotations.read_only_hint, Some(true));
        assert_eq!(annotations.destructive_hint, Some(false));
    }
}
