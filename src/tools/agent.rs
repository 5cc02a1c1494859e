use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use super::handler;
use crate::api::PortApi;
use crate::models::AgentInvocationStatus;
use crate::schema::{FieldSpec, ObjectSchema};
use crate::tool::{Annotations, ToolDescriptor};

/// How long `invoke_ai_agent` waits for an invocation to finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AgentPolling {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for AgentPolling {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
        }
    }
}

impl AgentPolling {
    fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

pub(super) fn tools(client: &Arc<dyn PortApi>) -> Vec<ToolDescriptor> {
    vec![invoke_ai_agent(client, AgentPolling::default())]
}

fn invoke_ai_agent(client: &Arc<dyn PortApi>, polling: AgentPolling) -> ToolDescriptor {
    ToolDescriptor::new(
        "invoke_ai_agent",
        "Invoke a Port AI agent with a natural language prompt and wait for its answer. \
         The agent can answer questions about the software catalog and may trigger actions.",
        ObjectSchema::new().field(
            FieldSpec::string("prompt")
                .required()
                .min_length(1)
                .description("The prompt to send to the AI agent"),
        ),
        ObjectSchema::new()
            .field(FieldSpec::string("invocation_id").required())
            .field(
                FieldSpec::string("invocation_status")
                    .required()
                    .description("Final status, or timed_out if the agent was still running"),
            )
            .field(FieldSpec::string("message").required())
            .field(FieldSpec::string("selected_agent"))
            .field(FieldSpec::string("action_url").description(
                "Page to visit when the agent needs the user to finish an action",
            )),
        Annotations::write("Invoke AI Agent", false).open_world(),
        handler(client, move |client, args| async move {
            let prompt = args.str("prompt").unwrap_or_default();
            let invocation_id = client.trigger_agent(prompt).await?;
            tracing::info!(invocation_id = %invocation_id, "AI agent invoked");

            for attempt in 1..=polling.max_attempts {
                let status = client.get_invocation_status(&invocation_id).await?;
                if status.is_finished() {
                    return Ok(finished(&invocation_id, status));
                }
                tracing::debug!(
                    invocation_id = %invocation_id,
                    attempt,
                    status = %status.status,
                    "AI agent still running"
                );
                if attempt < polling.max_attempts {
                    tokio::time::sleep(polling.interval).await;
                }
            }

            tracing::warn!(invocation_id = %invocation_id, "AI agent invocation timed out");
            Ok(json!({
                "invocation_id": invocation_id,
                "invocation_status": "timed_out",
                "message": format!(
                    "Agent invocation timed out after {}s; it may still complete in Port",
                    polling.budget().as_secs()
                ),
            }))
        }),
    )
}

fn finished(invocation_id: &str, status: AgentInvocationStatus) -> Value {
    let invocation_status = status.normalized_status();
    let message = match (&status.error, &status.output) {
        (Some(error), _) if invocation_status != "completed" => error.clone(),
        (_, Some(output)) => output.clone(),
        (Some(error), None) => error.clone(),
        (None, None) => String::new(),
    };
    let mut out = json!({
        "invocation_id": invocation_id,
        "invocation_status": invocation_status,
        "message": message,
    });
    if let Some(agent) = status.selected_agent {
        out["selected_agent"] = json!(agent);
    }
    if let Some(url) = status.action_url {
        out["action_url"] = json!(url);
    }
    out
}
