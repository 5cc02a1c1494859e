use serde_json::Value;

use super::{ApiPath, PortClient, extract, flag};
use crate::api::{ApiFuture, CreateEntityQuery, EntitiesApi};
use crate::schema::JsonObject;

impl CreateEntityQuery {
    fn to_query(&self) -> [(&'static str, String); 4] {
        [
            ("upsert", flag(self.upsert)),
            ("merge", flag(self.merge)),
            ("validation_only", flag(self.validation_only)),
            (
                "create_missing_related_entities",
                flag(self.create_missing_related_entities),
            ),
        ]
    }
}

impl EntitiesApi for PortClient {
    fn get_entities<'a>(&'a self, blueprint: &'a str) -> ApiFuture<'a, Vec<Value>> {
        Box::pin(async move {
            tracing::info!(blueprint = %blueprint, "getting entities");
            let path = ApiPath::new(["blueprints", blueprint, "entities"]);
            let body = self.get(&path).await?;
            extract(body, "entities", path)
        })
    }

    fn get_entity<'a>(&'a self, blueprint: &'a str, entity: &'a str) -> ApiFuture<'a, Value> {
        Box::pin(async move {
            tracing::info!(blueprint = %blueprint, entity = %entity, "getting entity");
            let path = ApiPath::new(["blueprints", blueprint, "entities", entity]);
            let body = self.get(&path).await?;
            extract(body, "entity", path)
        })
    }

    fn create_entity<'a>(
        &'a self,
        blueprint: &'a str,
        entity: JsonObject,
        query: CreateEntityQuery,
    ) -> ApiFuture<'a, Value> {
        Box::pin(async move {
            tracing::info!(blueprint = %blueprint, ?query, "creating entity");
            let path = ApiPath::new(["blueprints", blueprint, "entities"]);
            let body = self
                .post_with(&path, &query.to_query(), Value::Object(entity))
                .await?;
            extract(body, "entity", path)
        })
    }

    fn update_entity<'a>(
        &'a self,
        blueprint: &'a str,
        entity: &'a str,
        patch: JsonObject,
    ) -> ApiFuture<'a, Value> {
        Box::pin(async move {
            tracing::info!(blueprint = %blueprint, entity = %entity, "updating entity");
            let path = ApiPath::new(["blueprints", blueprint, "entities", entity]);
            let body = self.patch(&path, Value::Object(patch)).await?;
            extract(body, "entity", path)
        })
    }

    fn delete_entity<'a>(
        &'a self,
        blueprint: &'a str,
        entity: &'a str,
        delete_dependents: bool,
    ) -> ApiFuture<'a, bool> {
        Box::pin(async move {
            tracing::info!(blueprint = %blueprint, entity = %entity, delete_dependents, "deleting entity");
            let path = ApiPath::new(["blueprints", blueprint, "entities", entity]);
            self.delete(&path, &[("delete_dependents", flag(delete_dependents))])
                .await?;
            Ok(true)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::authed_client;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_create_entity_sends_query_flags() {
        let server = MockServer::start().await;
        let client = authed_client(&server).await;
        Mock::given(method("POST"))
            .and(path("/v1/blueprints/service/entities"))
            .and(query_param("upsert", "true"))
            .and(query_param("merge", "false"))
            .and(query_param("validation_only", "false"))
            .and(query_param("create_missing_related_entities", "true"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "ok": true,
                "entity": {"identifier": "checkout", "blueprint": "service"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let entity = json!({"identifier": "checkout"}).as_object().cloned().unwrap();
        let query = CreateEntityQuery {
            upsert: true,
            create_missing_related_entities: true,
            ..Default::default()
        };
        let created = client.create_entity("service", entity, query).await.unwrap();
        assert_eq!(created["identifier"], json!("checkout"));
    }

    #[tokio::test]
    async fn test_delete_entity_with_dependents() {
        let server = MockServer::start().await;
        let client = authed_client(&server).await;
        Mock::given(method("DELETE"))
            .and(path("/v1/blueprints/service/entities/checkout"))
            .and(query_param("delete_dependents", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        assert!(client.delete_entity("service", "checkout", true).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_entity_not_found() {
        let server = MockServer::start().await;
        let client = authed_client(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/blueprints/service/entities/ghost"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "ok": false,
                "message": "Entity with identifier \"ghost\" not found"
            })))
            .mount(&server)
            .await;

        let err = client.get_entity("service", "ghost").await.unwrap_err();
        assert!(matches!(err, crate::PortMcpError::Api { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_entity_identifier_with_reserved_characters() {
        let server = MockServer::start().await;
        let client = authed_client(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/blueprints/service/entities/team%2Fa%3Fx=1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "entity": {"identifier": "team/a?x=1"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let entity = client.get_entity("service", "team/a?x=1").await.unwrap();
        assert_eq!(entity["identifier"], json!("team/a?x=1"));
    }

    #[tokio::test]
    async fn test_traversal_identifier_cannot_reach_another_resource() {
        let server = MockServer::start().await;
        let client = authed_client(&server).await;
        Mock::given(method("DELETE"))
            .and(path("/v1/blueprints/service"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(
                "/v1/blueprints/service/entities/..%2F..%2F..%2Fblueprints%2Fservice",
            ))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"ok": false})))
            .expect(1)
            .mount(&server)
            .await;

        let err = client
            .delete_entity("service", "../../../blueprints/service", false)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::PortMcpError::Api { status: 404, .. }));

        let err = client.delete_entity("service", "..", false).await.unwrap_err();
        assert!(matches!(err, crate::PortMcpError::InvalidArguments(_)));
    }
}
