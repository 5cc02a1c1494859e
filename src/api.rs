//! Collaborator interfaces for the Port API.
//!
//! Tool handlers and the action-tool synthesizer depend on these traits, not
//! on [`crate::client::PortClient`], so they can be exercised against a mock.
//! Methods return boxed futures so the traits stay object-safe behind
//! `Arc<dyn PortApi>`.

use futures::future::BoxFuture;
use serde_json::Value;

use crate::models::{Action, ActionRun, ActionSummary, AgentInvocationStatus};
use crate::schema::JsonObject;

pub type ApiFuture<'a, T> = BoxFuture<'a, crate::Result<T>>;

pub trait BlueprintsApi: Send + Sync {
    fn get_blueprints(&self) -> ApiFuture<'_, Vec<Value>>;
    fn get_blueprint<'a>(&'a self, identifier: &'a str) -> ApiFuture<'a, Value>;
    fn create_blueprint(&self, blueprint: JsonObject) -> ApiFuture<'_, Value>;
    fn update_blueprint<'a>(
        &'a self,
        identifier: &'a str,
        blueprint: JsonObject,
    ) -> ApiFuture<'a, Value>;
    fn delete_blueprint<'a>(&'a self, identifier: &'a str) -> ApiFuture<'a, bool>;
}

/// Query flags for entity creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct CreateEntityQuery {
    #[serde(default)]
    pub upsert: bool,
    #[serde(default)]
    pub merge: bool,
    #[serde(default)]
    pub validation_only: bool,
    #[serde(default)]
    pub create_missing_related_entities: bool,
}

pub trait EntitiesApi: Send + Sync {
    fn get_entities<'a>(&'a self, blueprint: &'a str) -> ApiFuture<'a, Vec<Value>>;
    fn get_entity<'a>(&'a self, blueprint: &'a str, entity: &'a str) -> ApiFuture<'a, Value>;
    fn create_entity<'a>(
        &'a self,
        blueprint: &'a str,
        entity: JsonObject,
        query: CreateEntityQuery,
    ) -> ApiFuture<'a, Value>;
    fn update_entity<'a>(
        &'a self,
        blueprint: &'a str,
        entity: &'a str,
        patch: JsonObject,
    ) -> ApiFuture<'a, Value>;
    fn delete_entity<'a>(
        &'a self,
        blueprint: &'a str,
        entity: &'a str,
        delete_dependents: bool,
    ) -> ApiFuture<'a, bool>;
}

pub trait ScorecardsApi: Send + Sync {
    fn get_scorecards(&self) -> ApiFuture<'_, Vec<Value>>;
    fn get_scorecard<'a>(&'a self, blueprint: &'a str, scorecard: &'a str)
    -> ApiFuture<'a, Value>;
    fn create_scorecard<'a>(
        &'a self,
        blueprint: &'a str,
        scorecard: JsonObject,
    ) -> ApiFuture<'a, Value>;
    fn update_scorecard<'a>(
        &'a self,
        blueprint: &'a str,
        scorecard_identifier: &'a str,
        scorecard: JsonObject,
    ) -> ApiFuture<'a, Value>;
    fn delete_scorecard<'a>(
        &'a self,
        blueprint: &'a str,
        scorecard: &'a str,
    ) -> ApiFuture<'a, bool>;
}

pub trait ActionsApi: Send + Sync {
    /// All actions, or only those of one blueprint.
    fn list_actions<'a>(&'a self, blueprint: Option<&'a str>)
    -> ApiFuture<'a, Vec<ActionSummary>>;
    fn get_action<'a>(&'a self, identifier: &'a str) -> ApiFuture<'a, Action>;
    fn create_action(&self, action: JsonObject) -> ApiFuture<'_, Value>;
    fn update_action<'a>(&'a self, identifier: &'a str, action: JsonObject)
    -> ApiFuture<'a, Value>;
    fn delete_action<'a>(&'a self, identifier: &'a str) -> ApiFuture<'a, bool>;
}

pub trait ActionRunsApi: Send + Sync {
    fn create_global_action_run<'a>(
        &'a self,
        action: &'a str,
        properties: JsonObject,
    ) -> ApiFuture<'a, ActionRun>;
    fn create_entity_action_run<'a>(
        &'a self,
        action: &'a str,
        entity: &'a str,
        properties: JsonObject,
    ) -> ApiFuture<'a, ActionRun>;
    fn get_action_run<'a>(&'a self, run_id: &'a str) -> ApiFuture<'a, ActionRun>;
}

pub trait PermissionsApi: Send + Sync {
    fn get_user_permissions(&self) -> ApiFuture<'_, Vec<String>>;
    fn get_action_permissions<'a>(&'a self, action: &'a str) -> ApiFuture<'a, Value>;
    fn update_action_policies<'a>(
        &'a self,
        action: &'a str,
        policies: JsonObject,
    ) -> ApiFuture<'a, Value>;
}

pub trait AgentApi: Send + Sync {
    /// Start an AI agent invocation; returns its identifier.
    fn trigger_agent<'a>(&'a self, prompt: &'a str) -> ApiFuture<'a, String>;
    fn get_invocation_status<'a>(
        &'a self,
        invocation_id: &'a str,
    ) -> ApiFuture<'a, AgentInvocationStatus>;
}

/// Everything the tool surface needs from Port.
pub trait PortApi:
    BlueprintsApi
    + EntitiesApi
    + ScorecardsApi
    + ActionsApi
    + ActionRunsApi
    + PermissionsApi
    + AgentApi
{
    /// Base URL of the Port web app, for run links.
    fn ui_base_url(&self) -> &str;
}

/// Link to an action run in the Port web app.
pub fn action_run_url(ui_base: &str, run_id: &str) -> String {
    format!(
        "{}/organization/run?runId={}",
        ui_base.trim_end_matches('/'),
        run_id
    )
}

/// Whether a permission list grants execution of `action`, and through which grants.
pub fn action_execute_grants(action: &str, permissions: &[String]) -> Vec<&'static str> {
    let direct = format!("execute:actions:{action}");
    let team = format!("execute:team_entities:actions:{action}");
    let mut grants = Vec::new();
    if permissions.iter().any(|p| *p == direct) {
        grants.push("execute:actions");
    }
    if permissions.iter().any(|p| *p == team) {
        grants.push("execute:team_entities:actions");
    }
    grants
}
