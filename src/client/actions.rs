use serde_json::{Value, json};

use super::{ApiPath, PortClient, extract, extract_or_body};
use crate::api::{ActionRunsApi, ActionsApi, ApiFuture};
use crate::models::{Action, ActionRun, ActionSummary};
use crate::schema::JsonObject;

impl ActionsApi for PortClient {
    fn list_actions<'a>(
        &'a self,
        blueprint: Option<&'a str>,
    ) -> ApiFuture<'a, Vec<ActionSummary>> {
        Box::pin(async move {
            tracing::info!(blueprint = ?blueprint, "listing actions");
            let mut query = vec![("version", "v2".to_string())];
            if let Some(bp) = blueprint {
                query.push(("blueprint_identifier", bp.to_string()));
            }
            let body = self.get_with(&ApiPath::new(["actions"]), &query).await?;
            extract(body, "actions", "actions")
        })
    }

    fn get_action<'a>(&'a self, identifier: &'a str) -> ApiFuture<'a, Action> {
        Box::pin(async move {
            tracing::debug!(action = %identifier, "getting action");
            let path = ApiPath::new(["actions", identifier]);
            let body = self.get(&path).await?;
            extract(body, "action", path)
        })
    }

    fn create_action(&self, action: JsonObject) -> ApiFuture<'_, Value> {
        Box::pin(async move {
            tracing::info!(action = ?action.get("identifier"), "creating action");
            let body = self.post(&ApiPath::new(["actions"]), Value::Object(action)).await?;
            extract(body, "action", "actions")
        })
    }

    fn update_action<'a>(
        &'a self,
        identifier: &'a str,
        action: JsonObject,
    ) -> ApiFuture<'a, Value> {
        Box::pin(async move {
            tracing::info!(action = %identifier, "updating action");
            let path = ApiPath::new(["actions", identifier]);
            let body = self.put(&path, Value::Object(action)).await?;
            extract(body, "action", path)
        })
    }

    fn delete_action<'a>(&'a self, identifier: &'a str) -> ApiFuture<'a, bool> {
        Box::pin(async move {
            tracing::info!(action = %identifier, "deleting action");
            self.delete(&ApiPath::new(["actions", identifier]), &[]).await?;
            Ok(true)
        })
    }
}

impl ActionRunsApi for PortClient {
    fn create_global_action_run<'a>(
        &'a self,
        action: &'a str,
        properties: JsonObject,
    ) -> ApiFuture<'a, ActionRun> {
        Box::pin(async move {
            tracing::info!(action = %action, "creating global action run");
            let path = ApiPath::new(["actions", action, "runs"]);
            let body = self
                .post(&path, json!({ "properties": properties }))
                .await?;
            extract_or_body(body, "run", path)
        })
    }

    fn create_entity_action_run<'a>(
        &'a self,
        action: &'a str,
        entity: &'a str,
        properties: JsonObject,
    ) -> ApiFuture<'a, ActionRun> {
        Box::pin(async move {
            tracing::info!(action = %action, entity = %entity, "creating entity action run");
            let path = ApiPath::new(["actions", action, "runs"]);
            let body = self
                .post(&path, json!({ "entity": entity, "properties": properties }))
                .await?;
            extract_or_body(body, "run", path)
        })
    }

    fn get_action_run<'a>(&'a self, run_id: &'a str) -> ApiFuture<'a, ActionRun> {
        Box::pin(async move {
            tracing::debug!(run_id = %run_id, "getting action run");
            let path = ApiPath::new(["actions", "runs", run_id]);
            let body = self
                .get_with(&path, &[("version", "v2".to_string())])
                .await?;
            extract_or_body(body, "run", path)
        })
    }
}
