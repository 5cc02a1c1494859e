//! Statically registered Port tools, one submodule per resource.

mod actions;
mod agent;
mod blueprints;
mod entities;
mod permissions;
mod scorecards;

use std::future::Future;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::api::PortApi;
use crate::schema::{FieldSpec, ValidatedArgs};
use crate::tool::{HandlerFuture, ToolDescriptor, ToolHandler};

/// Identifier pattern Port enforces for blueprints, entities, scorecards and actions.
pub(crate) const IDENTIFIER_PATTERN: &str = r"^[A-Za-z0-9@_.+:/=-]+$";

/// Every static tool, in listing order.
pub fn static_tools(client: Arc<dyn PortApi>) -> Vec<ToolDescriptor> {
    let mut tools = Vec::new();
    tools.extend(blueprints::tools(&client));
    tools.extend(entities::tools(&client));
    tools.extend(scorecards::tools(&client));
    tools.extend(actions::tools(&client));
    tools.extend(permissions::tools(&client));
    tools.extend(agent::tools(&client));
    tools
}

/// Bind an async handler body to a shared client.
pub(crate) fn handler<F, Fut>(client: &Arc<dyn PortApi>, body: F) -> impl ToolHandler + 'static
where
    F: Fn(Arc<dyn PortApi>, ValidatedArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = crate::Result<Value>> + Send + 'static,
{
    let client = client.clone();
    move |args: ValidatedArgs| -> HandlerFuture { Box::pin(body(client.clone(), args)) }
}

/// Required identifier argument.
pub(crate) fn identifier_arg(name: &str, description: &str) -> FieldSpec {
    FieldSpec::string(name).required().description(description)
}

/// `detailed` flag controlling summary vs full records.
pub(crate) fn detailed_arg(default: bool) -> FieldSpec {
    FieldSpec::boolean("detailed")
        .default_value(Value::Bool(default))
        .description("If true, return complete records. If false, return summary information only.")
}

/// Keep only `keys` of a record; non-objects pass through unchanged.
pub(crate) fn summarize(record: Value, keys: &[&str]) -> Value {
    match record {
        Value::Object(mut map) => {
            let summary: Map<String, Value> = keys
                .iter()
                .filter_map(|key| map.remove(*key).map(|v| (key.to_string(), v)))
                .collect();
            Value::Object(summary)
        }
        other => other,
    }
}

/// Standard result of delete tools.
pub(crate) fn deleted(kind: &str, identifier: &str) -> Value {
    serde_json::json!({
        "success": true,
        "message": format!("{kind} '{identifier}' deleted successfully"),
    })
}
