use std::sync::Arc;

use serde_json::{Value, json};

use super::{IDENTIFIER_PATTERN, deleted, detailed_arg, handler, identifier_arg, summarize};
use crate::api::PortApi;
use crate::schema::{FieldKind, FieldSpec, JsonObject, ObjectSchema};
use crate::tool::{Annotations, ToolDescriptor};

const SUMMARY_KEYS: &[&str] = &["identifier", "title", "blueprint"];

pub(super) fn tools(client: &Arc<dyn PortApi>) -> Vec<ToolDescriptor> {
    vec![
        get_scorecards(client),
        get_scorecard(client),
        create_scorecard(client),
        update_scorecard(client),
        delete_scorecard(client),
    ]
}

/// Port's stock level ladder, used when a scorecard is created without levels.
fn default_levels() -> Value {
    json!([
        {"title": "Basic", "color": "paleBlue"},
        {"title": "Bronze", "color": "bronze"},
        {"title": "Silver", "color": "silver"},
        {"title": "Gold", "color": "gold"}
    ])
}

fn level_schema() -> ObjectSchema {
    ObjectSchema::new()
        .field(FieldSpec::string("title").required().description("Level title"))
        .field(FieldSpec::string("color").required().description("Level color, e.g. gold"))
}

fn rule_schema() -> ObjectSchema {
    ObjectSchema::new()
        .field(FieldSpec::string("identifier").required().pattern(IDENTIFIER_PATTERN))
        .field(FieldSpec::string("title").required())
        .field(
            FieldSpec::string("level")
                .required()
                .description("Title of the level this rule belongs to"),
        )
        .field(FieldSpec::object("query").required().description(
            "Rule query: {\"combinator\": \"and\"|\"or\", \"conditions\": [...]}",
        ))
        .field(FieldSpec::string("description"))
        .allow_additional()
}

/// Scorecard body fields shared by create and update.
fn with_scorecard_body(schema: ObjectSchema, require_body: bool) -> ObjectSchema {
    let title = FieldSpec::string("title").description("Display title of the scorecard");
    let levels = FieldSpec::array("levels", FieldKind::Object(Some(level_schema())))
        .description("Levels from lowest to highest");
    let (title, levels) = if require_body {
        (title.required(), levels.default_value(default_levels()))
    } else {
        (title, levels)
    };
    schema
        .field(title)
        .field(levels)
        .field(
            FieldSpec::array("rules", FieldKind::Object(Some(rule_schema())))
                .description("Rules entities must pass to reach each level"),
        )
        .field(FieldSpec::object("filter").description(
            "Query restricting which entities the scorecard applies to",
        ))
        .allow_additional()
}

/// Split the blueprint identifier off validated arguments, leaving the scorecard body.
fn split_blueprint(mut body: JsonObject) -> (String, JsonObject) {
    let blueprint = match body.remove("blueprint_identifier") {
        Some(Value::String(bp)) => bp,
        _ => String::new(),
    };
    (blueprint, body)
}

fn get_scorecards(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "get_scorecards",
        "Get all of the scorecards in your organization",
        ObjectSchema::new().field(detailed_arg(false)),
        ObjectSchema::new().field(
            FieldSpec::array("scorecards", FieldKind::Object(None))
                .required()
                .description("The list of scorecards"),
        ),
        Annotations::read_only("Get Scorecards"),
        handler(client, |client, args| async move {
            let scorecards = client.get_scorecards().await?;
            let scorecards: Vec<Value> = if args.bool_or("detailed", false) {
                scorecards
            } else {
                scorecards
                    .into_iter()
                    .map(|sc| summarize(sc, SUMMARY_KEYS))
                    .collect()
            };
            Ok(json!({ "scorecards": scorecards }))
        }),
    )
}

fn get_scorecard(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "get_scorecard",
        "Get a specific scorecard of a given blueprint using its identifier",
        ObjectSchema::new()
            .field(identifier_arg(
                "blueprint_identifier",
                "The identifier of the blueprint the scorecard belongs to",
            ))
            .field(identifier_arg(
                "scorecard_identifier",
                "The identifier of the scorecard to get",
            )),
        ObjectSchema::new().allow_additional(),
        Annotations::read_only("Get Scorecard"),
        handler(client, |client, args| async move {
            let blueprint = args.str("blueprint_identifier").unwrap_or_default();
            let scorecard = args.str("scorecard_identifier").unwrap_or_default();
            client.get_scorecard(blueprint, scorecard).await
        }),
    )
}

fn create_scorecard(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    let input = ObjectSchema::new()
        .field(identifier_arg(
            "blueprint_identifier",
            "The identifier of the blueprint to create the scorecard for",
        ))
        .field(
            identifier_arg("identifier", "Unique identifier of the scorecard")
                .pattern(IDENTIFIER_PATTERN),
        );

    ToolDescriptor::new(
        "create_scorecard",
        "Create scorecards to define and track metrics and standards for Port entities, based \
         on their properties",
        with_scorecard_body(input, true),
        ObjectSchema::new().allow_additional(),
        Annotations::write("Create Scorecard", false),
        handler(client, |client, args| async move {
            let (blueprint, body) = split_blueprint(args.into_map());
            client.create_scorecard(&blueprint, body).await
        }),
    )
}

fn update_scorecard(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    let input = ObjectSchema::new()
        .field(identifier_arg(
            "blueprint_identifier",
            "The identifier of the blueprint the scorecard belongs to",
        ))
        .field(identifier_arg(
            "scorecard_identifier",
            "The identifier of the scorecard to update",
        ));

    ToolDescriptor::new(
        "update_scorecard",
        "Update a scorecard of a specific blueprint using its identifier",
        with_scorecard_body(input, false),
        ObjectSchema::new().allow_additional(),
        Annotations::write("Update Scorecard", true),
        handler(client, |client, args| async move {
            let (blueprint, mut body) = split_blueprint(args.into_map());
            let scorecard = match body.remove("scorecard_identifier") {
                Some(Value::String(id)) => id,
                _ => String::new(),
            };
            client.update_scorecard(&blueprint, &scorecard, body).await
        }),
    )
}

fn delete_scorecard(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "delete_scorecard",
        "Delete a scorecard from a given blueprint using its identifier",
        ObjectSchema::new()
            .field(identifier_arg(
                "blueprint_identifier",
                "The identifier of the blueprint the scorecard belongs to",
            ))
            .field(identifier_arg(
                "scorecard_identifier",
                "The identifier of the scorecard to delete",
            )),
        ObjectSchema::new()
            .field(FieldSpec::boolean("success").required())
            .field(FieldSpec::string("message").required()),
        Annotations::destructive("Delete Scorecard"),
        handler(client, |client, args| async move {
            let blueprint = args.str("blueprint_identifier").unwrap_or_default();
            let scorecard = args.str("scorecard_identifier").unwrap_or_default();
            client.delete_scorecard(blueprint, scorecard).await?;
            Ok(deleted("Scorecard", scorecard))
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
    async fn test_create_scorecard_default_levels() {
        let mock = Arc::new(MockPort::new().with_reply("create_scorecard", json!({"identifier": "ownership"})));
        let tools = tools(&api(&mock));
        run(
            find(&tools, "create_scorecard"),
            json!({"blueprint_identifier": "service", "identifier": "ownership", "title": "Ownership"}),
        )
        .await
        .unwrap();
        let calls = mock.calls_to("create_scorecard");
        assert_eq!(calls[0]["blueprint"], json!("service"));
        assert_eq!(calls[0]["scorecard"]["levels"], default_levels());
        assert!(calls[0]["scorecard"].get("blueprint_identifier").is_none());
    }

    #[tokio::test]
    async fn test_create_scorecard_rule_errors_are_indexed() {
        let mock = Arc::new(MockPort::new());
        let tools = tools(&api(&mock));
        let err = run(
            find(&tools, "create_scorecard"),
            json!({
                "blueprint_identifier": "service",
                "identifier": "ownership",
                "title": "Ownership",
                "rules": [{"identifier": "has-owner", "title": "Has owner", "level": "Gold"}]
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(&err, PortMcpError::Validation { report, .. } if report.fields() == vec!["rules.0.query"]));
    }

    #[tokio::test]
    async fn test_update_scorecard_routes_identifiers() {
        let mock = Arc::new(MockPort::new().with_reply("update_scorecard", json!({"identifier": "ownership"})));
        let tools = tools(&api(&mock));
        run(
            find(&tools, "update_scorecard"),
            json!({"blueprint_identifier": "service", "scorecard_identifier": "ownership", "title": "Owners"}),
        )
        .await
        .unwrap();
        assert_eq!(
            mock.calls_to("update_scorecard"),
            vec![json!({"blueprint": "service", "identifier": "ownership", "scorecard": {"title": "Owners"}})]
        );
    }

    #[tokio::test]
    async fn test_get_scorecards_summary() {
        let mock = Arc::new(MockPort::new().with_reply(
            "get_scorecards",
            json!([{"identifier": "dora", "title": "DORA", "blueprint": "service", "rules": []}]),
        ));
        let tools = tools(&api(&mock));
        let out = run(find(&tools, "get_scorecards"), json!({})).await.unwrap();
        assert_eq!(
            out,
            json!({"scorecards": [{"identifier": "dora", "title": "DORA", "blueprint": "service"}]})
        );
    }
}
