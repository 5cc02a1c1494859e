//! ToolRegistry: the single entry point for tool lookup and dispatch.
//!
//! Holds static tools registered at startup plus the dynamic action tools
//! discovered on first use, keeps them in registration order, and routes
//! tool calls through validated dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use rmcp::model::{CallToolResult, Tool};
use tokio::sync::{Mutex, RwLock, watch};

use crate::api::PortApi;
use crate::dispatch::execute_tool;
use crate::dynamic::ActionToolSynthesizer;
use crate::error::PortMcpError;
use crate::schema::JsonObject;
use crate::tool::ToolDescriptor;

/// How dynamic action tool discovery ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    /// Actions were listed; `tools` of them became tools.
    Succeeded { tools: usize },
    /// The action listing could not be fetched. Not retried.
    Failed,
}

/// Lifecycle of dynamic action tool discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryState {
    NotLoaded,
    Loading,
    Loaded(DiscoveryOutcome),
}

/// Marks discovery failed if the discovering future is dropped mid-run,
/// so the state never stays `Loading` with nobody driving it.
struct LoadingGuard<'a> {
    discovery: &'a watch::Sender<DiscoveryState>,
    armed: bool,
}

impl LoadingGuard<'_> {
    fn finish(mut self, outcome: DiscoveryOutcome) {
        self.armed = false;
        self.discovery.send_replace(DiscoveryState::Loaded(outcome));
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::error!("dynamic action tool discovery cancelled before completion");
            self.discovery
                .send_replace(DiscoveryState::Loaded(DiscoveryOutcome::Failed));
        }
    }
}

/// Name-keyed tool table that remembers first-registration order.
#[derive(Default)]
struct ToolTable {
    order: Vec<String>,
    by_name: HashMap<String, Arc<ToolDescriptor>>,
}

impl ToolTable {
    /// Insert or replace; a replaced tool keeps its original position.
    fn insert(&mut self, tool: ToolDescriptor) -> Option<Arc<ToolDescriptor>> {
        let name = tool.name().to_string();
        let previous = self.by_name.insert(name.clone(), Arc::new(tool));
        if previous.is_none() {
            self.order.push(name);
        }
        previous
    }

    fn iter(&self) -> impl Iterator<Item = &Arc<ToolDescriptor>> {
        self.order.iter().filter_map(|name| self.by_name.get(name))
    }
}

/// Registry of every tool the server exposes.
///
/// Tool names are unique: registering an existing name replaces the earlier
/// tool. Dynamic action tools are loaded at most once per registry, on the
/// first [`ensure_dynamic_tools_loaded`](Self::ensure_dynamic_tools_loaded);
/// concurrent first callers share one discovery run.
pub struct ToolRegistry {
    tools: RwLock<ToolTable>,
    synthesizer: Option<ActionToolSynthesizer>,
    /// Serializes discovery so only one run ever talks to Port.
    discovery_lock: Mutex<()>,
    discovery: watch::Sender<DiscoveryState>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Empty registry without dynamic discovery.
    pub fn new() -> Self {
        let (discovery, _) = watch::channel(DiscoveryState::NotLoaded);
        Self {
            tools: RwLock::new(ToolTable::default()),
            synthesizer: None,
            discovery_lock: Mutex::new(()),
            discovery,
        }
    }

    /// Registry pre-filled with the static Port tools, optionally with
    /// dynamic action tool discovery enabled.
    pub fn for_client(client: Arc<dyn PortApi>, dynamic_actions: bool) -> Self {
        let mut table = ToolTable::default();
        for tool in crate::tools::static_tools(client.clone()) {
            table.insert(tool);
        }
        let registry = Self {
            tools: RwLock::new(table),
            ..Self::new()
        };
        if dynamic_actions {
            registry.with_synthesizer(ActionToolSynthesizer::new(client))
        } else {
            registry
        }
    }

    /// Enable dynamic action tools from `synthesizer`.
    pub fn with_synthesizer(mut self, synthesizer: ActionToolSynthesizer) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Add a tool, replacing any tool already registered under the same name.
    pub async fn register_tool(&self, tool: ToolDescriptor) {
        let name = tool.name().to_string();
        if self.tools.write().await.insert(tool).is_some() {
            tracing::warn!(tool = %name, "tool registered twice; replacing earlier definition");
        } else {
            tracing::debug!(tool = %name, "tool registered");
        }
    }

    /// Exact-name lookup.
    pub async fn get_tool(&self, name: &str) -> crate::Result<Arc<ToolDescriptor>> {
        self.tools
            .read()
            .await
            .by_name
            .get(name)
            .cloned()
            .ok_or_else(|| PortMcpError::ToolNotFound(name.to_string()))
    }

    /// Resolve a set of names, in the order given; all registered tools when `None`.
    ///
    /// Fails on the first unknown name.
    pub async fn get_tools(&self, names: Option<&[&str]>) -> crate::Result<Vec<Arc<ToolDescriptor>>> {
        let table = self.tools.read().await;
        match names {
            None => Ok(table.iter().cloned().collect()),
            Some(names) => names
                .iter()
                .map(|name| {
                    table
                        .by_name
                        .get(*name)
                        .cloned()
                        .ok_or_else(|| PortMcpError::ToolNotFound(name.to_string()))
                })
                .collect(),
        }
    }

    /// MCP tool listing in registration order.
    pub async fn list_tools(&self) -> Vec<Tool> {
        self.tools
            .read()
            .await
            .iter()
            .map(|tool| tool.to_mcp_tool())
            .collect()
    }

    /// Names of all registered tools in registration order.
    pub async fn tool_names(&self) -> Vec<String> {
        self.tools.read().await.order.clone()
    }

    pub async fn len(&self) -> usize {
        self.tools.read().await.order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Current discovery state.
    pub fn discovery_state(&self) -> DiscoveryState {
        *self.discovery.borrow()
    }

    /// Load dynamic action tools unless a previous call already did.
    ///
    /// Callers arriving while discovery runs wait for it and then return.
    /// A failed listing is terminal: the registry keeps serving static tools.
    /// So is a run whose caller is cancelled midway.
    pub async fn ensure_dynamic_tools_loaded(&self) {
        if matches!(self.discovery_state(), DiscoveryState::Loaded(_)) {
            return;
        }
        let _flight = self.discovery_lock.lock().await;
        if self.discovery_state() != DiscoveryState::NotLoaded {
            return;
        }

        let Some(synthesizer) = &self.synthesizer else {
            self.discovery
                .send_replace(DiscoveryState::Loaded(DiscoveryOutcome::Succeeded { tools: 0 }));
            return;
        };

        self.discovery.send_replace(DiscoveryState::Loading);
        let guard = LoadingGuard {
            discovery: &self.discovery,
            armed: true,
        };
        tracing::info!("loading dynamic action tools");

        let outcome = match synthesizer.discover().await {
            Ok(outcome) => {
                for failure in &outcome.failures {
                    tracing::warn!(error = %failure, "failed to create dynamic action tool");
                }
                let count = outcome.tools.len();
                for tool in outcome.tools {
                    self.register_tool(tool).await;
                }
                tracing::info!(
                    tool_count = count,
                    failed = outcome.failures.len(),
                    skipped = outcome.skipped,
                    "dynamic action tools loaded"
                );
                DiscoveryOutcome::Succeeded { tools: count }
            }
            Err(e) => {
                tracing::error!(error = %e, "dynamic action tool discovery failed; serving static tools only");
                DiscoveryOutcome::Failed
            }
        };
        guard.finish(outcome);
    }

    /// Look up `name` and run it through validated dispatch.
    ///
    /// Triggers dynamic discovery first so action tools are callable even
    /// before any listing.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> crate::Result<CallToolResult> {
        self.ensure_dynamic_tools_loaded().await;
        let tool = self.get_tool(name).await?;
        execute_tool(&tool, arguments).await
    }
}
