//! Port MCP: Model Context Protocol server for Port.io
//! Exposes blueprints, entities, scorecards, actions and permissions as
//! schema-validated tools, plus one dynamically synthesized tool per Port action.
//! Transport wiring lives in the `port-mcp` binary.

pub mod api;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod dynamic;
pub mod error;
pub mod models;
pub mod registry;
pub mod schema;
pub mod server;
pub mod tool;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{PortApi, action_execute_grants, action_run_url};
pub use client::PortClient;
pub use config::{PortMcpConfig, Region, parse_env_ref};
pub use dispatch::execute_tool;
pub use dynamic::{ActionRunHandler, ActionToolSynthesizer, camel_to_snake};
pub use error::{PortMcpError, Result};
pub use registry::{DiscoveryOutcome, DiscoveryState, ToolRegistry};
pub use schema::{FieldSpec, ObjectSchema, ValidatedArgs, ValidationReport};
pub use server::PortMcpServer;
pub use tool::{Annotations, ToolDescriptor, ToolHandler};
