use std::sync::Arc;

use serde_json::{Value, json};

use super::{handler, identifier_arg};
use crate::api::{PortApi, action_execute_grants};
use crate::schema::{FieldKind, FieldSpec, ObjectSchema};
use crate::tool::{Annotations, ToolDescriptor};

pub(super) fn tools(client: &Arc<dyn PortApi>) -> Vec<ToolDescriptor> {
    vec![
        get_user_permissions(client),
        check_action_permission(client),
        get_action_permissions(client),
        update_action_policies(client),
    ]
}

fn get_user_permissions(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "get_user_permissions",
        "Get the permissions and RBAC grants of the current user",
        ObjectSchema::new(),
        ObjectSchema::new()
            .field(
                FieldSpec::array("permissions", FieldKind::String(Default::default()))
                    .required()
                    .description("Permission strings, e.g. execute:actions:deploy"),
            )
            .field(FieldSpec::integer("total_count").required()),
        Annotations::read_only("Get User Permissions"),
        handler(client, |client, _args| async move {
            let permissions = client.get_user_permissions().await?;
            Ok(json!({
                "total_count": permissions.len(),
                "permissions": permissions,
            }))
        }),
    )
}

fn check_action_permission(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "check_action_permission",
        "Check whether the current user may execute an action",
        ObjectSchema::new().field(identifier_arg(
            "action_identifier",
            "The identifier of the action to check",
        )),
        ObjectSchema::new()
            .field(FieldSpec::string("action_identifier").required())
            .field(FieldSpec::boolean("has_permission").required())
            .field(
                FieldSpec::array("permission_types", FieldKind::String(Default::default()))
                    .required()
                    .description("Grants that allow execution"),
            ),
        Annotations::read_only("Check Action Permission"),
        handler(client, |client, args| async move {
            let action = args.str("action_identifier").unwrap_or_default();
            let permissions = client.get_user_permissions().await?;
            let grants = action_execute_grants(action, &permissions);
            Ok(json!({
                "action_identifier": action,
                "has_permission": !grants.is_empty(),
                "permission_types": grants,
            }))
        }),
    )
}

fn get_action_permissions(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "get_action_permissions",
        "Get the permission, approval and execution settings of an action",
        ObjectSchema::new().field(identifier_arg(
            "action_identifier",
            "The identifier of the action",
        )),
        ObjectSchema::new().allow_additional(),
        Annotations::read_only("Get Action Permissions"),
        handler(client, |client, args| async move {
            let action = args.str("action_identifier").unwrap_or_default();
            client.get_action_permissions(action).await
        }),
    )
}

fn update_action_policies(client: &Arc<dyn PortApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "update_action_policies",
        "Update the permission policies of an action, such as who may execute or approve it",
        ObjectSchema::new()
            .field(identifier_arg(
                "action_identifier",
                "The identifier of the action to update",
            ))
            .field(FieldSpec::object("policies").required().description(
                "Policy settings, e.g. {\"execute\": {\"roles\": [...]}, \"approve\": {...}}",
            )),
        ObjectSchema::new().allow_additional(),
        Annotations::write("Update Action Policies", true),
        handler(client, |client, args| async move {
            let action = args.str("action_identifier").unwrap_or_default();
            let policies = args
                .get("policies")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            client.update_action_policies(action, policies).await
        }),
    )
}
