use serde::Deserialize;
use serde_json::json;

use super::{ApiPath, PortClient, extract, extract_or_body};
use crate::api::{AgentApi, ApiFuture};
use crate::models::AgentInvocationStatus;

#[derive(Deserialize)]
struct Invocation {
    identifier: String,
}

impl AgentApi for PortClient {
    fn trigger_agent<'a>(&'a self, prompt: &'a str) -> ApiFuture<'a, String> {
        Box::pin(async move {
            tracing::info!(prompt_len = prompt.len(), "invoking AI agent");
            let path = ApiPath::new(["agent", "invoke"]);
            let body = self.post(&path, json!({ "prompt": prompt })).await?;
            let invocation: Invocation = extract(body, "invocation", path)?;
            Ok(invocation.identifier)
        })
    }

    fn get_invocation_status<'a>(
        &'a self,
        invocation_id: &'a str,
    ) -> ApiFuture<'a, AgentInvocationStatus> {
        Box::pin(async move {
            tracing::debug!(invocation_id = %invocation_id, "getting agent invocation status");
            let path = ApiPath::new(["agent", "invoke", invocation_id]);
            let body = self.get(&path).await?;
            extract_or_body(body, "result", path)
        })
    }
}
