use std::sync::Arc;

use serde_json::{Value, json};

use super::{IDENTIFIER_PATTERN, deleted, detailed_arg, handler, identifier_arg, summarize};
use crate::api::PortApi;
use crate::schema::{FieldKind, FieldSpec, ObjectSchema};
use crate::tool::{Annotations, ToolDescriptor};

const SUMMARY_KEYS: &[&str] = &["identifier", "title", "description"];

pub(super) fn tools(client: &Arc<dyn PortApi>) -> Vec<ToolDescriptor> {
    vec![
        get_blueprints(client),
        get_blueprint(client),
        create_blueprint(client),
        update_blueprint(client),
        delete_blueprint(client),
    ]
}

/// Optional blueprint sections shared by create and update.
fn with_blueprint_sections(schema: ObjectSchema) -> ObjectSchema {
    schema
        .field(FieldSpec::string("icon").description("Icon of the blueprint"))
        .field(FieldSpec::string("description").description("Description of the blueprint"))
        .field(FieldSpec::object("calculationProperties").description(
            "Properties computed from other properties of the same blueprint",
        ))
        .field(FieldSpec::object("mirrorProperties").description(
            "Properties mirrored from related entities",
        ))
        .field(FieldSpec::object("aggregationProperties").description(
            "Properties aggregated over related entities",
        ))
        .field(FieldSpec::object("relations").description(
            "Relations to other blueprints, keyed by relation identifier",
        ))
        .field(FieldSpec::object("ownership").description("Ownership settings of the blueprint"))
        .allow_additional()
}

fn get_blueprints(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "get_blueprints",
        "Get all of the blueprints in your organization",
        ObjectSchema::new().field(detailed_arg(false)),
        ObjectSchema::new().field(
            FieldSpec::array("blueprints", FieldKind::Object(None))
                .required()
                .description("The list of blueprints"),
        ),
        Annotations::read_only("Get Blueprints"),
        handler(client, |client, args| async move {
            let detailed = args.bool_or("detailed", false);
            let blueprints = client.get_blueprints().await?;
            let blueprints: Vec<Value> = if detailed {
                blueprints
            } else {
                blueprints
                    .into_iter()
                    .map(|bp| summarize(bp, SUMMARY_KEYS))
                    .collect()
            };
            Ok(json!({ "blueprints": blueprints }))
        }),
    )
}

fn get_blueprint(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "get_blueprint",
        "Get a blueprint using its identifier",
        ObjectSchema::new()
            .field(identifier_arg(
                "blueprint_identifier",
                "The identifier of the blueprint to get",
            ))
            .field(detailed_arg(true)),
        ObjectSchema::new().allow_additional(),
        Annotations::read_only("Get Blueprint"),
        handler(client, |client, args| async move {
            let identifier = args.str("blueprint_identifier").unwrap_or_default();
            let blueprint = client.get_blueprint(identifier).await?;
            if args.bool_or("detailed", true) {
                Ok(blueprint)
            } else {
                Ok(summarize(blueprint, SUMMARY_KEYS))
            }
        }),
    )
}

fn create_blueprint(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    let input = ObjectSchema::new()
        .field(
            identifier_arg("identifier", "Unique identifier of the blueprint")
                .pattern(IDENTIFIER_PATTERN)
                .max_length(100),
        )
        .field(
            FieldSpec::string("title")
                .required()
                .max_length(100)
                .description("Display title of the blueprint"),
        )
        .field(
            FieldSpec::object("schema")
                .default_value(json!({"properties": {}, "required": []}))
                .description("Property schema: {\"properties\": {...}, \"required\": [...]}"),
        );

    ToolDescriptor::new(
        "create_blueprint",
        "Create blueprints which are the most basic building block in Port. They are used to \
         represent assets in your organization, and the relationships between them.",
        with_blueprint_sections(input),
        ObjectSchema::new().allow_additional(),
        Annotations::write("Create Blueprint", false),
        handler(client, |client, args| async move {
            client.create_blueprint(args.into_map()).await
        }),
    )
}

fn update_blueprint(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    let input = ObjectSchema::new()
        .field(identifier_arg(
            "identifier",
            "The identifier of the blueprint to update",
        ))
        .field(FieldSpec::string("title").description("New display title"))
        .field(FieldSpec::object("schema").description("Replacement property schema"));

    ToolDescriptor::new(
        "update_blueprint",
        "Update a blueprint using its identifier. Only the supplied sections are changed.",
        with_blueprint_sections(input),
        ObjectSchema::new().allow_additional(),
        Annotations::write("Update Blueprint", true),
        handler(client, |client, args| async move {
            let mut patch = args.into_map();
            let identifier = match patch.remove("identifier") {
                Some(Value::String(id)) => id,
                _ => String::new(),
            };
            client.update_blueprint(&identifier, patch).await
        }),
    )
}

fn delete_blueprint(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "delete_blueprint",
        "Delete a blueprint using its identifier",
        ObjectSchema::new().field(identifier_arg(
            "blueprint_identifier",
            "The identifier of the blueprint to delete",
        )),
        ObjectSchema::new()
            .field(FieldSpec::boolean("success").required())
            .field(FieldSpec::string("message").required()),
        Annotations::destructive("Delete Blueprint"),
        handler(client, |client, args| async move {
            let identifier = args.str("blueprint_identifier").unwrap_or_default();
            client.delete_blueprint(identifier).await?;
            Ok(deleted("Blueprint", identifier))
        }),
    )
}
