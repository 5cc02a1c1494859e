//! Dynamic action tools: one `run_<action>` tool per Port action.
//!
//! The synthesizer lists the organization's actions, fetches each action's
//! definition and builds a [`ToolDescriptor`] whose handler triggers that
//! action. A failure on one action is recorded and the batch continues; only
//! a failed listing fails the whole discovery.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::PortApi;
use crate::error::PortMcpError;
use crate::models::{Action, ActionSummary, resolve_identifier};
use crate::schema::{FieldSpec, JsonObject, ObjectSchema, ValidatedArgs};
use crate::tool::{Annotations, HandlerFuture, ToolDescriptor, ToolHandler};

/// Upper bound on generated tool names; hosts prefix tool names with the
/// server name and reject anything past 64 characters.
pub const MAX_TOOL_NAME_LEN: usize = 40;

/// Convert `camelCase` / `PascalCase` to `snake_case`.
///
/// Acronym runs stay together (`XMLHttpRequest` → `xml_http_request`) and
/// existing underscores are kept.
pub fn camel_to_snake(name: &str) -> String {
    static WORD: OnceLock<Regex> = OnceLock::new();
    static BOUNDARY: OnceLock<Regex> = OnceLock::new();
    let word = WORD.get_or_init(|| Regex::new("(.)([A-Z][a-z]+)").expect("valid regex"));
    let boundary =
        BOUNDARY.get_or_init(|| Regex::new("([a-z0-9])([A-Z])").expect("valid regex"));

    let split = word.replace_all(name, "${1}_${2}");
    boundary.replace_all(&split, "${1}_${2}").to_lowercase()
}

/// Tool name for an action: `run_<snake_case identifier>`, at most
/// [`MAX_TOOL_NAME_LEN`] characters.
pub fn action_tool_name(identifier: &str) -> String {
    format!("run_{}", camel_to_snake(identifier))
        .chars()
        .take(MAX_TOOL_NAME_LEN)
        .collect()
}

fn is_valid_tool_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Where an action run is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunTarget {
    Global,
    Entity(String),
}

/// Input accepted by every generated action tool.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionRunInput {
    #[serde(default)]
    pub entity_identifier: Option<String>,
    #[serde(default)]
    pub properties: Option<JsonObject>,
}

impl ActionRunInput {
    pub fn target(&self) -> RunTarget {
        match self.entity_identifier.as_deref() {
            Some(entity) if !entity.is_empty() => RunTarget::Entity(entity.to_string()),
            _ => RunTarget::Global,
        }
    }
}

/// Handler shared by all generated action tools, parameterized by the action.
#[derive(Clone)]
pub struct ActionRunHandler {
    client: Arc<dyn PortApi>,
    action_identifier: String,
}

impl ActionRunHandler {
    pub fn new(client: Arc<dyn PortApi>, action_identifier: impl Into<String>) -> Self {
        Self {
            client,
            action_identifier: action_identifier.into(),
        }
    }

    pub fn action_identifier(&self) -> &str {
        &self.action_identifier
    }

    /// Trigger the action and wrap the run as `{"action_run": ...}`.
    pub async fn run(&self, input: ActionRunInput) -> crate::Result<Value> {
        let properties = input.properties.clone().unwrap_or_default();
        let run = match input.target() {
            RunTarget::Entity(entity) => {
                self.client
                    .create_entity_action_run(&self.action_identifier, &entity, properties)
                    .await?
            }
            RunTarget::Global => {
                self.client
                    .create_global_action_run(&self.action_identifier, properties)
                    .await?
            }
        };
        tracing::info!(action = %self.action_identifier, run_id = %run.id, "action run created");
        Ok(json!({ "action_run": run }))
    }
}

impl ToolHandler for ActionRunHandler {
    fn call(&self, args: ValidatedArgs) -> HandlerFuture {
        let handler = self.clone();
        Box::pin(async move {
            let input: ActionRunInput = args.parse()?;
            handler.run(input).await
        })
    }
}

fn action_tool_input_schema() -> ObjectSchema {
    ObjectSchema::new()
        .field(FieldSpec::string("entity_identifier").description(
            "Optional entity identifier if the action is entity-specific. If the action has a \
             blueprint and its operation is DAY-2 or DELETE, create or find the entity first and \
             pass its identifier here",
        ))
        .field(FieldSpec::object("properties").description(
            "Properties for the action. To see required properties, first call get_action with \
             action_identifier to view the userInputs schema.",
        ))
}

fn action_tool_output_schema() -> ObjectSchema {
    ObjectSchema::new().field(
        FieldSpec::object("action_run")
            .required()
            .description("Action run details including the run id for tracking"),
    )
}

/// Build the tool for one fully fetched action.
pub fn build_action_tool(action: &Action, client: Arc<dyn PortApi>) -> crate::Result<ToolDescriptor> {
    let name = action_tool_name(&action.identifier);
    if !is_valid_tool_name(&name) {
        return Err(PortMcpError::Synthesis(
            action.identifier.clone(),
            format!("derived tool name '{name}' contains characters not allowed in tool names"),
        ));
    }

    let title = action.display_title();
    let mut description = format!("Execute the '{title}' action");
    if let Some(extra) = action.description.as_deref().filter(|d| !d.is_empty()) {
        description.push_str(": ");
        description.push_str(extra);
    }
    description.push_str(&format!(
        "\n\nTo see required properties, first call get_action with action_identifier='{}' \
         to view the userInputs schema.",
        action.identifier
    ));

    Ok(ToolDescriptor::new(
        name,
        description,
        action_tool_input_schema(),
        action_tool_output_schema(),
        Annotations {
            title: format!("Run {title}"),
            read_only: false,
            destructive: false,
            idempotent: false,
            open_world: true,
        },
        ActionRunHandler::new(client, action.identifier.clone()),
    ))
}

/// Result of synthesizing a listing: tools built, and actions that could not be.
#[derive(Debug, Default)]
pub struct SynthesisOutcome {
    pub tools: Vec<ToolDescriptor>,
    pub failures: Vec<PortMcpError>,
    /// Listing entries without a resolvable identifier.
    pub skipped: usize,
}

/// Builds action tools from the live set of Port actions.
#[derive(Clone)]
pub struct ActionToolSynthesizer {
    client: Arc<dyn PortApi>,
    blueprint: Option<String>,
}

impl ActionToolSynthesizer {
    pub fn new(client: Arc<dyn PortApi>) -> Self {
        Self {
            client,
            blueprint: None,
        }
    }

    /// Only synthesize tools for actions of one blueprint.
    pub fn for_blueprint(mut self, blueprint: impl Into<String>) -> Self {
        self.blueprint = Some(blueprint.into());
        self
    }

    /// List actions and synthesize a tool for each.
    ///
    /// Errs only when the listing itself fails; per-action failures are
    /// returned in [`SynthesisOutcome::failures`].
    pub async fn discover(&self) -> crate::Result<SynthesisOutcome> {
        let actions = self.client.list_actions(self.blueprint.as_deref()).await?;
        tracing::debug!(count = actions.len(), "listed Port actions");
        Ok(self.synthesize_all(&actions).await)
    }

    /// Synthesize tools for an already fetched listing.
    pub async fn synthesize_all(&self, actions: &[ActionSummary]) -> SynthesisOutcome {
        let mut outcome = SynthesisOutcome::default();
        for summary in actions {
            let Some(identifier) = resolve_identifier(summary) else {
                tracing::warn!(action = ?summary, "skipping action without an identifier");
                outcome.skipped += 1;
                continue;
            };
            match self.synthesize(identifier).await {
                Ok(tool) => outcome.tools.push(tool),
                Err(e) => outcome.failures.push(e),
            }
        }
        outcome
    }

    async fn synthesize(&self, identifier: &str) -> crate::Result<ToolDescriptor> {
        let action = self
            .client
            .get_action(identifier)
            .await
            .map_err(|e| PortMcpError::Synthesis(identifier.to_string(), e.to_string()))?;
        build_action_tool(&action, self.client.clone())
    }

    /// All dynamic action tools; empty when the listing is unavailable.
    pub async fn get_dynamic_action_tools(&self) -> Vec<ToolDescriptor> {
        match self.discover().await {
            Ok(outcome) => {
                for failure in &outcome.failures {
                    tracing::warn!(error = %failure, "failed to create dynamic action tool");
                }
                tracing::info!(
                    tool_count = outcome.tools.len(),
                    failed = outcome.failures.len(),
                    skipped = outcome.skipped,
                    "dynamic action tools synthesized"
                );
                outcome.tools
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to list Port actions; no dynamic action tools");
                Vec::new()
            }
        }
    }
}
