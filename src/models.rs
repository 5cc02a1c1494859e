//! Port records the server reasons about directly.
//!
//! Blueprints, entities and scorecards pass through as raw JSON; only actions
//! and action runs need typed access (tool synthesis and run tracking).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::JsonObject;

/// One entry of an action listing.
///
/// Listings are not guaranteed to be uniform: well-formed entries carry a
/// string `identifier`, anything else is kept as-is so the rest of the batch
/// can still be processed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ActionSummary {
    Record(ActionRecord),
    Mapping(JsonObject),
    Other(Value),
}

/// A listing entry with a resolvable identifier.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ActionRecord {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl ActionSummary {
    pub fn identifier(&self) -> Option<&str> {
        resolve_identifier(self)
    }
}

/// Resolve the identifier of a listing entry, if it has one.
pub fn resolve_identifier(action: &ActionSummary) -> Option<&str> {
    match action {
        ActionSummary::Record(record) => Some(record.identifier.as_str()),
        ActionSummary::Mapping(map) => map.get("identifier").and_then(Value::as_str),
        ActionSummary::Other(_) => None,
    }
    .filter(|id| !id.is_empty())
}

/// Full action definition as returned by `GET /actions/{identifier}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Action {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub rest: JsonObject,
}

impl Action {
    /// Title for display, falling back to the identifier.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.identifier)
    }
}

/// An execution instance of an action.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ActionRun {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub rest: JsonObject,
}

/// Progress of an AI agent invocation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AgentInvocationStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, alias = "selectedAgent", skip_serializing_if = "Option::is_none")]
    pub selected_agent: Option<String>,
    #[serde(default, alias = "actionUrl", skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
}

impl AgentInvocationStatus {
    /// `status` lowercased with spaces as underscores, e.g. `In Progress` to `in_progress`.
    pub fn normalized_status(&self) -> String {
        self.status.trim().to_ascii_lowercase().replace([' ', '-'], "_")
    }

    /// Whether the invocation has stopped running.
    pub fn is_finished(&self) -> bool {
        matches!(
            self.normalized_status().as_str(),
            "completed" | "failed" | "error" | "cancelled" | "canceled"
        )
    }
}
