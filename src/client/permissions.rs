use serde_json::{Value, json};

use super::{ApiPath, PortClient, extract};
use crate::api::{ApiFuture, PermissionsApi};
use crate::schema::JsonObject;

impl PermissionsApi for PortClient {
    fn get_user_permissions(&self) -> ApiFuture<'_, Vec<String>> {
        Box::pin(async move {
            tracing::info!("getting user permissions");
            let path = ApiPath::new(["auth", "permissions"]);
            let body = self
                .get_with(&path, &[("action_version", "v2".to_string())])
                .await?;
            extract(body, "permissions", path)
        })
    }

    fn get_action_permissions<'a>(&'a self, action: &'a str) -> ApiFuture<'a, Value> {
        Box::pin(async move {
            tracing::info!(action = %action, "getting action permissions");
            let path = ApiPath::new(["actions", action]);
            let body = self.get(&path).await?;
            let definition: JsonObject = extract(body, "action", path)?;
            let field = |name: &str| definition.get(name).cloned().unwrap_or_else(|| json!({}));
            Ok(json!({
                "action_identifier": action,
                "permissions": field("permissions"),
                "approval_config": field("approval_config"),
                "execution_config": field("execution_config"),
            }))
        })
    }

    fn update_action_policies<'a>(
        &'a self,
        action: &'a str,
        policies: JsonObject,
    ) -> ApiFuture<'a, Value> {
        Box::pin(async move {
            tracing::info!(action = %action, "updating action policies");
            let path = ApiPath::new(["actions", action]);
            let body = self.patch(&path, json!({ "policies": policies })).await?;
            let updated: JsonObject = extract(body, "action", path)?;
            Ok(json!({
                "action_identifier": action,
                "updated_policies": updated.get("policies").cloned().unwrap_or_else(|| json!({})),
                "success": true,
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::authed_client;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_user_permissions() {
        let server = MockServer::start().await;
        let client = authed_client(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/auth/permissions"))
            .and(query_param("action_version", "v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "permissions": ["execute:actions:deploy", "read:blueprints"]
            })))
            .mount(&server)
            .await;

        let permissions = client.get_user_permissions().await.unwrap();
        assert_eq!(permissions, vec!["execute:actions:deploy", "read:blueprints"]);
    }

    #[tokio::test]
    async fn test_get_action_permissions_picks_fields() {
        let server = MockServer::start().await;
        let client = authed_client(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/actions/deploy"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "action": {
                    "identifier": "deploy",
                    "permissions": {"execute": {"roles": ["Admin"]}},
                    "trigger": {"type": "self-service"}
                }
            })))
            .mount(&server)
            .await;

        let permissions = client.get_action_permissions("deploy").await.unwrap();
        assert_eq!(permissions["permissions"]["execute"]["roles"], json!(["Admin"]));
        assert_eq!(permissions["approval_config"], json!({}));
        assert!(permissions.get("trigger").is_none());
    }

    #[tokio::test]
    async fn test_update_action_policies() {
        let server = MockServer::start().await;
        let client = authed_client(&server).await;
        let policies = json!({"queries": {}, "conditions": []});
        Mock::given(method("PATCH"))
            .and(path("/v1/actions/deploy"))
            .and(body_json(json!({"policies": policies.clone()})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "action": {"identifier": "deploy", "policies": policies.clone()}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = client
            .update_action_policies("deploy", policies.as_object().cloned().unwrap())
            .await
            .unwrap();
        assert_eq!(result["success"], json!(true));
        assert_eq!(result["updated_policies"], policies);
    }
}
