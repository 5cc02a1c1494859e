use serde_json::Value;

use super::{ApiPath, PortClient, extract};
use crate::api::{ApiFuture, BlueprintsApi};
use crate::schema::JsonObject;

impl BlueprintsApi for PortClient {
    fn get_blueprints(&self) -> ApiFuture<'_, Vec<Value>> {
        Box::pin(async move {
            tracing::info!("getting all blueprints from Port");
            let body = self.get(&ApiPath::new(["blueprints"])).await?;
            extract(body, "blueprints", "blueprints")
        })
    }

    fn get_blueprint<'a>(&'a self, identifier: &'a str) -> ApiFuture<'a, Value> {
        Box::pin(async move {
            tracing::info!(blueprint = %identifier, "getting blueprint");
            let path = ApiPath::new(["blueprints", identifier]);
            let body = self.get(&path).await?;
            extract(body, "blueprint", path)
        })
    }

    fn create_blueprint(&self, blueprint: JsonObject) -> ApiFuture<'_, Value> {
        Box::pin(async move {
            tracing::info!(blueprint = ?blueprint.get("identifier"), "creating blueprint");
            let body = self.post(&ApiPath::new(["blueprints"]), Value::Object(blueprint)).await?;
            extract(body, "blueprint", "blueprints")
        })
    }

    fn update_blueprint<'a>(
        &'a self,
        identifier: &'a str,
        blueprint: JsonObject,
    ) -> ApiFuture<'a, Value> {
        Box::pin(async move {
            tracing::info!(blueprint = %identifier, "updating blueprint");
            let path = ApiPath::new(["blueprints", identifier]);
            let body = self.patch(&path, Value::Object(blueprint)).await?;
            extract(body, "blueprint", path)
        })
    }

    fn delete_blueprint<'a>(&'a self, identifier: &'a str) -> ApiFuture<'a, bool> {
        Box::pin(async move {
            tracing::info!(blueprint = %identifier, "deleting blueprint");
            self.delete(&ApiPath::new(["blueprints", identifier]), &[]).await?;
            Ok(true)
        })
    }
}
