use std::sync::Arc;

use serde_json::{Value, json};

use super::{IDENTIFIER_PATTERN, deleted, handler, identifier_arg};
use crate::api::{PortApi, action_run_url};
use crate::dynamic::{ActionRunHandler, ActionRunInput};
use crate::error::PortMcpError;
use crate::schema::{FieldKind, FieldSpec, ObjectSchema};
use crate::tool::{Annotations, ToolDescriptor};

pub(super) fn tools(client: &Arc<dyn PortApi>) -> Vec<ToolDescriptor> {
    vec![
        list_actions(client),
        get_action(client),
        create_action(client),
        update_action(client),
        delete_action(client),
        run_action(client),
        track_action_run(client),
    ]
}

/// Action definition fields shared by create and update.
fn with_action_body(schema: ObjectSchema) -> ObjectSchema {
    schema
        .field(FieldSpec::string("icon").description("Icon of the action"))
        .field(FieldSpec::string("description").description("Description of the action"))
        .field(FieldSpec::any("requiredApproval").description(
            "Whether runs need approval: a boolean or an approval policy object",
        ))
        .field(FieldSpec::object("approvalNotification").description(
            "How approvers are notified",
        ))
        .field(FieldSpec::boolean("publish").description("Whether the action is visible to users"))
        .allow_additional()
}

fn run_output_schema() -> ObjectSchema {
    ObjectSchema::new()
        .field(
            FieldSpec::object("action_run")
                .required()
                .description("Action run details including the run id for tracking"),
        )
        .field(
            FieldSpec::string("ui_link")
                .required()
                .description("Direct link to the action run in the Port UI"),
        )
}

fn list_actions(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "list_actions",
        "Get all available actions in Port, optionally filtered by blueprint",
        ObjectSchema::new().field(
            FieldSpec::string("blueprint_identifier")
                .description("Only return actions of this blueprint"),
        ),
        ObjectSchema::new().field(
            FieldSpec::array("actions", FieldKind::Object(None))
                .required()
                .description("The list of available actions"),
        ),
        Annotations::read_only("List Actions"),
        handler(client, |client, args| async move {
            let actions = client.list_actions(args.str("blueprint_identifier")).await?;
            Ok(json!({ "actions": actions }))
        }),
    )
}

fn get_action(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "get_action",
        "Get an action using its identifier, including its trigger.userInputs schema",
        ObjectSchema::new().field(identifier_arg(
            "action_identifier",
            "The identifier of the action to get",
        )),
        ObjectSchema::new().allow_additional(),
        Annotations::read_only("Get Action"),
        handler(client, |client, args| async move {
            let identifier = args.str("action_identifier").unwrap_or_default();
            let action = client.get_action(identifier).await?;
            serde_json::to_value(action)
                .map_err(|e| PortMcpError::ToolCall("get_action".into(), e.to_string()))
        }),
    )
}

fn create_action(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    let input = ObjectSchema::new()
        .field(
            identifier_arg("identifier", "Unique identifier of the action")
                .pattern(IDENTIFIER_PATTERN),
        )
        .field(
            FieldSpec::string("title")
                .required()
                .description("Display title of the action"),
        )
        .field(FieldSpec::object("trigger").required().description(
            "Trigger definition: type, operation, blueprintIdentifier and userInputs",
        ))
        .field(FieldSpec::object("invocationMethod").required().description(
            "Backend invoked by a run, e.g. a webhook, GitHub workflow or Kafka topic",
        ));

    ToolDescriptor::new(
        "create_action",
        "Create a self-service action or automation in Port",
        with_action_body(input),
        ObjectSchema::new().allow_additional(),
        Annotations::write("Create Action", false),
        handler(client, |client, args| async move {
            client.create_action(args.into_map()).await
        }),
    )
}

fn update_action(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    let input = ObjectSchema::new()
        .field(identifier_arg(
            "action_identifier",
            "The identifier of the action to update",
        ))
        .field(FieldSpec::string("title").description("New display title"))
        .field(FieldSpec::object("trigger").description("Replacement trigger definition"))
        .field(FieldSpec::object("invocationMethod").description("Replacement invocation method"));

    ToolDescriptor::new(
        "update_action",
        "Update an existing action using its identifier",
        with_action_body(input),
        ObjectSchema::new().allow_additional(),
        Annotations::write("Update Action", true),
        handler(client, |client, args| async move {
            let mut body = args.into_map();
            let identifier = match body.remove("action_identifier") {
                Some(Value::String(id)) => id,
                _ => String::new(),
            };
            body.insert("identifier".into(), Value::String(identifier.clone()));
            client.update_action(&identifier, body).await
        }),
    )
}

fn delete_action(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "delete_action",
        "Delete an action using its identifier",
        ObjectSchema::new().field(identifier_arg(
            "action_identifier",
            "The identifier of the action to delete",
        )),
        ObjectSchema::new()
            .field(FieldSpec::boolean("success").required())
            .field(FieldSpec::string("message").required()),
        Annotations::destructive("Delete Action"),
        handler(client, |client, args| async move {
            let identifier = args.str("action_identifier").unwrap_or_default();
            client.delete_action(identifier).await?;
            Ok(deleted("Action", identifier))
        }),
    )
}

fn run_action(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "run_action",
        "Run a Port action and return the action run details for tracking",
        ObjectSchema::new()
            .field(identifier_arg(
                "action_identifier",
                "The identifier of the action to run",
            ))
            .field(FieldSpec::string("entity_identifier").description(
                "Entity to run the action on, for DAY-2 and DELETE actions of a blueprint",
            ))
            .field(FieldSpec::object("properties").description(
                "Action properties matching the action's trigger.userInputs schema",
            )),
        run_output_schema(),
        Annotations::write("Run Action", false).open_world(),
        handler(client, |client, args| async move {
            let input: ActionRunInput = args.parse()?;
            let action = args.str("action_identifier").unwrap_or_default();
            let runner = ActionRunHandler::new(client.clone(), action);
            let mut output = runner.run(input).await?;
            let run_id = output["action_run"]["id"].as_str().unwrap_or_default().to_string();
            output["ui_link"] = json!(action_run_url(client.ui_base_url(), &run_id));
            Ok(output)
        }),
    )
}

fn track_action_run(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "track_action_run",
        "Get the current status and details of an action run",
        ObjectSchema::new().field(identifier_arg(
            "run_id",
            "The id of the action run to track",
        )),
        run_output_schema().field(
            FieldSpec::string("status")
                .required()
                .description("Run status, e.g. IN_PROGRESS, SUCCESS or FAILURE"),
        ),
        Annotations::read_only("Track Action Run").open_world(),
        handler(client, |client, args| async move {
            let run_id = args.str("run_id").unwrap_or_default();
            let run = client.get_action_run(run_id).await?;
            let status = run.status.clone().unwrap_or_else(|| "UNKNOWN".to_string());
            Ok(json!({
                "action_run": run,
                "status": status,
                "ui_link": action_run_url(client.ui_base_url(), run_id),
            }))
        }),
    )
}
