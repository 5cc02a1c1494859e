use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};

use super::{IDENTIFIER_PATTERN, deleted, detailed_arg, handler, identifier_arg, summarize};
use crate::api::{CreateEntityQuery, PortApi};
use crate::schema::{FieldKind, FieldSpec, JsonObject, ObjectSchema};
use crate::tool::{Annotations, ToolDescriptor};

const SUMMARY_KEYS: &[&str] = &["identifier", "title"];

pub(super) fn tools(client: &Arc<dyn PortApi>) -> Vec<ToolDescriptor> {
    vec![
        get_entities(client),
        get_entity(client),
        create_entity(client),
        update_entity(client),
        delete_entity(client),
    ]
}

/// Body of an entity as sent to Port.
fn entity_schema() -> ObjectSchema {
    ObjectSchema::new()
        .field(
            FieldSpec::string("identifier")
                .pattern(IDENTIFIER_PATTERN)
                .description("Unique identifier of the entity; generated by Port when omitted"),
        )
        .field(FieldSpec::string("title").description("Display title of the entity"))
        .field(FieldSpec::string("icon").description("Icon of the entity"))
        .field(
            FieldSpec::array("team", FieldKind::String(Default::default()))
                .description("Teams owning the entity"),
        )
        .field(FieldSpec::object("properties").description(
            "Property values keyed by the blueprint's property identifiers",
        ))
        .field(FieldSpec::object("relations").description(
            "Related entity identifiers keyed by relation identifier",
        ))
        .allow_additional()
}

fn query_schema() -> ObjectSchema {
    ObjectSchema::new()
        .field(FieldSpec::boolean("upsert").default_value(json!(false)).description(
            "If true, override the entire entity if it already exists",
        ))
        .field(FieldSpec::boolean("merge").default_value(json!(false)).description(
            "If true and upsert is also true, update the entity if it already exists",
        ))
        .field(
            FieldSpec::boolean("validation_only")
                .default_value(json!(false))
                .description("If true, only validate the entity and return validation errors"),
        )
        .field(
            FieldSpec::boolean("create_missing_related_entities")
                .default_value(json!(false))
                .description("If true, also create related entities that do not exist yet"),
        )
}

#[derive(Deserialize)]
struct CreateEntityInput {
    blueprint_identifier: String,
    entity: JsonObject,
    #[serde(default)]
    query: CreateEntityQuery,
}

fn get_entities(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "get_entities",
        "Get all of the entities for a given blueprint",
        ObjectSchema::new()
            .field(identifier_arg(
                "blueprint_identifier",
                "The identifier of the blueprint to get entities for",
            ))
            .field(detailed_arg(false)),
        ObjectSchema::new().field(
            FieldSpec::array("entities", FieldKind::Object(None))
                .required()
                .description("The list of entities"),
        ),
        Annotations::read_only("Get Entities"),
        handler(client, |client, args| async move {
            let blueprint = args.str("blueprint_identifier").unwrap_or_default();
            let entities = client.get_entities(blueprint).await?;
            let entities: Vec<Value> = if args.bool_or("detailed", false) {
                entities
            } else {
                entities
                    .into_iter()
                    .map(|e| summarize(e, SUMMARY_KEYS))
                    .collect()
            };
            Ok(json!({ "entities": entities }))
        }),
    )
}

fn get_entity(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "get_entity",
        "Get an entity from a given blueprint using its identifier",
        ObjectSchema::new()
            .field(identifier_arg(
                "blueprint_identifier",
                "The identifier of the blueprint the entity belongs to",
            ))
            .field(identifier_arg(
                "entity_identifier",
                "The identifier of the entity to get",
            ))
            .field(detailed_arg(true)),
        ObjectSchema::new().allow_additional(),
        Annotations::read_only("Get Entity"),
        handler(client, |client, args| async move {
            let blueprint = args.str("blueprint_identifier").unwrap_or_default();
            let entity = args.str("entity_identifier").unwrap_or_default();
            let record = client.get_entity(blueprint, entity).await?;
            if args.bool_or("detailed", true) {
                Ok(record)
            } else {
                Ok(summarize(record, SUMMARY_KEYS))
            }
        }),
    )
}

fn create_entity(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "create_entity",
        "Create an entity which is an instance of a blueprint; it represents the data defined \
         by the blueprint's properties.",
        ObjectSchema::new()
            .field(identifier_arg(
                "blueprint_identifier",
                "The identifier of the blueprint to create the entity for",
            ))
            .field(
                FieldSpec::nested("entity", entity_schema())
                    .required()
                    .description("The entity to create"),
            )
            .field(
                FieldSpec::nested("query", query_schema())
                    .default_value(json!({}))
                    .description("Options controlling how the entity is created"),
            ),
        ObjectSchema::new().allow_additional(),
        Annotations::write("Create Entity", false),
        handler(client, |client, args| async move {
            let input: CreateEntityInput = args.parse()?;
            client
                .create_entity(&input.blueprint_identifier, input.entity, input.query)
                .await
        }),
    )
}

fn update_entity(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "update_entity",
        "Update an entity of a specific blueprint using its identifier. Only the supplied \
         fields are changed.",
        ObjectSchema::new()
            .field(identifier_arg(
                "blueprint_identifier",
                "The identifier of the blueprint the entity belongs to",
            ))
            .field(identifier_arg(
                "entity_identifier",
                "The identifier of the entity to update",
            ))
            .field(
                FieldSpec::nested("entity", entity_schema())
                    .required()
                    .description("Fields of the entity to update"),
            ),
        ObjectSchema::new().allow_additional(),
        Annotations::write("Update Entity", true),
        handler(client, |client, args| async move {
            let blueprint = args.str("blueprint_identifier").unwrap_or_default();
            let entity = args.str("entity_identifier").unwrap_or_default();
            let patch = args
                .get("entity")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            client.update_entity(blueprint, entity, patch).await
        }),
    )
}

fn delete_entity(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "delete_entity",
        "Delete an entity of a specific blueprint using its identifier",
        ObjectSchema::new()
            .field(identifier_arg(
                "blueprint_identifier",
                "The identifier of the blueprint the entity belongs to",
            ))
            .field(identifier_arg(
                "entity_identifier",
                "The identifier of the entity to delete",
            ))
            .field(
                FieldSpec::boolean("delete_dependents")
                    .default_value(json!(false))
                    .description("If true, also delete all of the entity's dependents"),
            ),
        ObjectSchema::new()
            .field(FieldSpec::boolean("success").required())
            .field(FieldSpec::string("message").required()),
        Annotations::destructive("Delete Entity"),
        handler(client, |client, args| async move {
            let blueprint = args.str("blueprint_identifier").unwrap_or_default();
            let entity = args.str("entity_identifier").unwrap_or_default();
            let delete_dependents = args.bool_or("delete_dependents", false);
            client
                .delete_entity(blueprint, entity, delete_dependents)
                .await?;
            Ok(deleted("Entity", entity))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PortMcpError;
    use crate::testing::MockPort;
    use crate::tools::test_support::{api, find, run};

    #[tokio::test]
    async fn test_get_entities_summary() {
        let mock = Arc::new(MockPort::new().with_reply(
            "get_entities",
            json!([{"identifier": "checkout", "title": "Checkout", "properties": {"language": "Rust"}}]),
        ));
        let tools = tools(&api(&mock));
        let out = run(
            find(&tools, "get_entities"),
            json!({"blueprint_identifier": "service"}),
        )
        .await
        .unwrap();
        assert_eq!(out, json!({"entities": [{"identifier": "checkout", "title": "Checkout"}]}));
    }

    #[tokio::test]
    async fn test_create_entity_query_defaults() {
        let mock = Arc::new(MockPort::new().with_reply("create_entity", json!({"identifier": "checkout"})));
        let tools = tools(&api(&mock));
        run(
            find(&tools, "create_entity"),
            json!({
                "blueprint_identifier": "service",
                "entity": {"identifier": "checkout", "properties": {"language": "Rust"}},
                "query": {"upsert": "true"}
            }),
        )
        .await
        .unwrap();
        assert_eq!(
            mock.calls_to("create_entity"),
            vec![json!({
                "blueprint": "service",
                "entity": {"identifier": "checkout", "properties": {"language": "Rust"}},
                "query": {
                    "upsert": true,
                    "merge": false,
                    "validation_only": false,
                    "create_missing_related_entities": false
                }
            })]
        );
    }

    #[tokio::test]
    async fn test_create_entity_nested_error_path() {
        let mock = Arc::new(MockPort::new());
        let tools = tools(&api(&mock));
        let err = run(
            find(&tools, "create_entity"),
            json!({"blueprint_identifier": "service", "entity": {"team": ["a", 7]}}),
        )
        .await
        .unwrap_err();
        assert!(matches!(&err, PortMcpError::Validation { report, .. } if report.fields() == vec!["entity.team.1"]));
    }

    #[tokio::test]
    async fn test_delete_entity_passes_dependents_flag() {
        let mock = Arc::new(MockPort::new().with_reply("delete_entity", json!(true)));
        let tools = tools(&api(&mock));
        run(
            find(&tools, "delete_entity"),
            json!({"blueprint_identifier": "service", "entity_identifier": "checkout", "delete_dependents": true}),
        )
        .await
        .unwrap();
        assert_eq!(
            mock.calls_to("delete_entity"),
            vec![json!({"blueprint": "service", "entity": "checkout", "delete_dependents": true})]
        );
    }

    #[tokio::test]
    async fn test_update_entity_sends_patch() {
        let mock = Arc::new(MockPort::new().with_reply("update_entity", json!({"identifier": "checkout"})));
        let tools = tools(&api(&mock));
        run(
            find(&tools, "update_entity"),
            json!({
                "blueprint_identifier": "service",
                "entity_identifier": "checkout",
                "entity": {"properties": {"tier": "gold"}}
            }),
        )
        .await
        .unwrap();
        assert_eq!(
            mock.calls_to("update_entity"),
            vec![json!({"blueprint": "service", "entity": "checkout", "patch": {"properties": {"tier": "gold"}}})]
        );
    }
}
