//! Test double for the Port collaborators.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::api::{
    ActionRunsApi, ActionsApi, AgentApi, ApiFuture, BlueprintsApi, CreateEntityQuery,
    EntitiesApi, PermissionsApi, PortApi, ScorecardsApi,
};
use crate::error::PortMcpError;
use crate::models::{Action, ActionRun, ActionSummary, AgentInvocationStatus};
use crate::schema::JsonObject;

/// Canned-response `PortApi`.
///
/// Replies are looked up by `"method:key"` first (key is the first identifier
/// argument), then by `"method"`. Every call is recorded with its arguments.
#[derive(Default)]
pub(crate) struct MockPort {
    replies: Mutex<HashMap<String, Result<Value, String>>>,
    calls: Mutex<Vec<(String, Value)>>,
    delay: Mutex<Option<Duration>>,
}

impl MockPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, key: &str, value: Value) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(key.to_string(), Ok(value));
        self
    }

    pub fn with_error(self, key: &str, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(key.to_string(), Err(message.to_string()));
        self
    }

    /// Delay every reply, to widen race windows in concurrency tests.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|(m, _)| m == method)
            .map(|(_, args)| args)
            .collect()
    }

    fn reply<T: DeserializeOwned + Send + 'static>(
        &self,
        method: &str,
        key: Option<&str>,
        args: Value,
    ) -> ApiFuture<'_, T> {
        self.calls.lock().unwrap().push((method.to_string(), args));
        let found = {
            let replies = self.replies.lock().unwrap();
            key.and_then(|k| replies.get(&format!("{method}:{k}")).cloned())
                .or_else(|| replies.get(method).cloned())
        };
        let delay = *self.delay.lock().unwrap();
        let method = method.to_string();
        Box::pin(async move {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }
            match found {
                Some(Ok(value)) => serde_json::from_value(value)
                    .map_err(|e| PortMcpError::UnexpectedResponse(method, e.to_string())),
                Some(Err(message)) => Err(PortMcpError::Api {
                    status: 500,
                    method: "MOCK".to_string(),
                    path: method,
                    message,
                }),
                None => Err(PortMcpError::Api {
                    status: 404,
                    method: "MOCK".to_string(),
                    path: method,
                    message: "no canned reply".to_string(),
                }),
            }
        })
    }
}

impl BlueprintsApi for MockPort {
    fn get_blueprints(&self) -> ApiFuture<'_, Vec<Value>> {
        self.reply("get_blueprints", None, json!({}))
    }

    fn get_blueprint<'a>(&'a self, identifier: &'a str) -> ApiFuture<'a, Value> {
        self.reply("get_blueprint", Some(identifier), json!({"identifier": identifier}))
    }

    fn create_blueprint(&self, blueprint: JsonObject) -> ApiFuture<'_, Value> {
        self.reply("create_blueprint", None, Value::Object(blueprint))
    }

    fn update_blueprint<'a>(
        &'a self,
        identifier: &'a str,
        blueprint: JsonObject,
    ) -> ApiFuture<'a, Value> {
        self.reply(
            "update_blueprint",
            Some(identifier),
            json!({"identifier": identifier, "blueprint": blueprint}),
        )
    }

    fn delete_blueprint<'a>(&'a self, identifier: &'a str) -> ApiFuture<'a, bool> {
        self.reply("delete_blueprint", Some(identifier), json!({"identifier": identifier}))
    }
}

impl EntitiesApi for MockPort {
    fn get_entities<'a>(&'a self, blueprint: &'a str) -> ApiFuture<'a, Vec<Value>> {
        self.reply("get_entities", Some(blueprint), json!({"blueprint": blueprint}))
    }

    fn get_entity<'a>(&'a self, blueprint: &'a str, entity: &'a str) -> ApiFuture<'a, Value> {
        self.reply(
            "get_entity",
            Some(entity),
            json!({"blueprint": blueprint, "entity": entity}),
        )
    }

    fn create_entity<'a>(
        &'a self,
        blueprint: &'a str,
        entity: JsonObject,
        query: CreateEntityQuery,
    ) -> ApiFuture<'a, Value> {
        self.reply(
            "create_entity",
            Some(blueprint),
            json!({"blueprint": blueprint, "entity": entity, "query": query}),
        )
    }

    fn update_entity<'a>(
        &'a self,
        blueprint: &'a str,
        entity: &'a str,
        patch: JsonObject,
    ) -> ApiFuture<'a, Value> {
        self.reply(
            "update_entity",
            Some(entity),
            json!({"blueprint": blueprint, "entity": entity, "patch": patch}),
        )
    }

    fn delete_entity<'a>(
        &'a self,
        blueprint: &'a str,
        entity: &'a str,
        delete_dependents: bool,
    ) -> ApiFuture<'a, bool> {
        self.reply(
            "delete_entity",
            Some(entity),
            json!({"blueprint": blueprint, "entity": entity, "delete_dependents": delete_dependents}),
        )
    }
}

impl ScorecardsApi for MockPort {
    fn get_scorecards(&self) -> ApiFuture<'_, Vec<Value>> {
        self.reply("get_scorecards", None, json!({}))
    }

    fn get_scorecard<'a>(
        &'a self,
        blueprint: &'a str,
        scorecard: &'a str,
    ) -> ApiFuture<'a, Value> {
        self.reply(
            "get_scorecard",
            Some(scorecard),
            json!({"blueprint": blueprint, "scorecard": scorecard}),
        )
    }

    fn create_scorecard<'a>(
        &'a self,
        blueprint: &'a str,
        scorecard: JsonObject,
    ) -> ApiFuture<'a, Value> {
        self.reply(
            "create_scorecard",
            Some(blueprint),
            json!({"blueprint": blueprint, "scorecard": scorecard}),
        )
    }

    fn update_scorecard<'a>(
        &'a self,
        blueprint: &'a str,
        scorecard_identifier: &'a str,
        scorecard: JsonObject,
    ) -> ApiFuture<'a, Value> {
        self.reply(
            "update_scorecard",
            Some(scorecard_identifier),
            json!({"blueprint": blueprint, "identifier": scorecard_identifier, "scorecard": scorecard}),
        )
    }

    fn delete_scorecard<'a>(
        &'a self,
        blueprint: &'a str,
        scorecard: &'a str,
    ) -> ApiFuture<'a, bool> {
        self.reply(
            "delete_scorecard",
            Some(scorecard),
            json!({"blueprint": blueprint, "scorecard": scorecard}),
        )
    }
}

impl ActionsApi for MockPort {
    fn list_actions<'a>(
        &'a self,
        blueprint: Option<&'a str>,
    ) -> ApiFuture<'a, Vec<ActionSummary>> {
        self.reply("list_actions", blueprint, json!({"blueprint": blueprint}))
    }

    fn get_action<'a>(&'a self, identifier: &'a str) -> ApiFuture<'a, Action> {
        self.reply("get_action", Some(identifier), json!({"identifier": identifier}))
    }

    fn create_action(&self, action: JsonObject) -> ApiFuture<'_, Value> {
        self.reply("create_action", None, Value::Object(action))
    }

    fn update_action<'a>(
        &'a self,
        identifier: &'a str,
        action: JsonObject,
    ) -> ApiFuture<'a, Value> {
        self.reply(
            "update_action",
            Some(identifier),
            json!({"identifier": identifier, "action": action}),
        )
    }

    fn delete_action<'a>(&'a self, identifier: &'a str) -> ApiFuture<'a, bool> {
        self.reply("delete_action", Some(identifier), json!({"identifier": identifier}))
    }
}

impl ActionRunsApi for MockPort {
    fn create_global_action_run<'a>(
        &'a self,
        action: &'a str,
        properties: JsonObject,
    ) -> ApiFuture<'a, ActionRun> {
        self.reply(
            "create_global_action_run",
            Some(action),
            json!({"action": action, "properties": properties}),
        )
    }

    fn create_entity_action_run<'a>(
        &'a self,
        action: &'a str,
        entity: &'a str,
        properties: JsonObject,
    ) -> ApiFuture<'a, ActionRun> {
        self.reply(
            "create_entity_action_run",
            Some(action),
            json!({"action": action, "entity": entity, "properties": properties}),
        )
    }

    fn get_action_run<'a>(&'a self, run_id: &'a str) -> ApiFuture<'a, ActionRun> {
        self.reply("get_action_run", Some(run_id), json!({"run_id": run_id}))
    }
}

impl PermissionsApi for MockPort {
    fn get_user_permissions(&self) -> ApiFuture<'_, Vec<String>> {
        self.reply("get_user_permissions", None, json!({}))
    }

    fn get_action_permissions<'a>(&'a self, action: &'a str) -> ApiFuture<'a, Value> {
        self.reply("get_action_permissions", Some(action), json!({"action": action}))
    }

    fn update_action_policies<'a>(
        &'a self,
        action: &'a str,
        policies: JsonObject,
    ) -> ApiFuture<'a, Value> {
        self.reply(
            "update_action_policies",
            Some(action),
            json!({"action": action, "policies": policies}),
        )
    }
}

impl AgentApi for MockPort {
    fn trigger_agent<'a>(&'a self, prompt: &'a str) -> ApiFuture<'a, String> {
        self.reply("trigger_agent", None, json!({"prompt": prompt}))
    }

    fn get_invocation_status<'a>(
        &'a self,
        invocation_id: &'a str,
    ) -> ApiFuture<'a, AgentInvocationStatus> {
        self.reply(
            "get_invocation_status",
            Some(invocation_id),
            json!({"invocation_id": invocation_id}),
        )
    }
}

impl PortApi for MockPort {
    fn ui_base_url(&self) -> &str {
        "https://app.getport.io"
    }
}
