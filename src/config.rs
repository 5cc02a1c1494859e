//! Port MCP server configuration: deserialization, environment overrides and validation.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::PortMcpError;

/// Strip an env var reference to its variable name.
///
/// Accepts `${VAR_NAME}` syntax only. Returns `None` if the value is not a
/// valid env-var reference.
pub fn parse_env_ref(value: &str) -> Option<&str> {
    value.strip_prefix("${").and_then(|s| s.strip_suffix('}'))
}

/// Resolve a `${VAR}` reference through `lookup`; literals pass through.
///
/// Unknown variables resolve to the empty string (same as shell `${UNSET-}`).
fn resolve_value(value: &str, lookup: &impl Fn(&str) -> Option<String>) -> String {
    match parse_env_ref(value) {
        Some(var_name) => lookup(var_name).unwrap_or_default(),
        None => value.to_string(),
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Port region hosting the organization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Region {
    #[default]
    #[serde(rename = "EU", alias = "eu")]
    Eu,
    #[serde(rename = "US", alias = "us")]
    Us,
}

impl Region {
    pub fn api_base(self) -> &'static str {
        match self {
            Region::Eu => "https://api.getport.io/v1",
            Region::Us => "https://api.us.getport.io/v1",
        }
    }

    pub fn ui_base(self) -> &'static str {
        match self {
            Region::Eu => "https://app.getport.io",
            Region::Us => "https://app.us.getport.io",
        }
    }
}

impl FromStr for Region {
    type Err = PortMcpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EU" => Ok(Region::Eu),
            "US" => Ok(Region::Us),
            other => Err(PortMcpError::InvalidConfig(format!(
                "region must be EU or US, got '{other}'"
            ))),
        }
    }
}

/// Top-level server configuration, parsed from `port-mcp.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct PortMcpConfig {
    /// OAuth client id. `${VAR}` references are resolved at load time.
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub region: Region,
    /// Overrides the region's API base, e.g. for a proxy.
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log to this file instead of stderr.
    #[serde(default)]
    pub log_path: Option<PathBuf>,
    /// Synthesize one `run_<action>` tool per Port action.
    #[serde(default = "default_enabled")]
    pub dynamic_actions: bool,
    /// Host application name, reported in the User-Agent.
    #[serde(default = "default_mcp_client")]
    pub mcp_client: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_mcp_client() -> String {
    "unknown".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for PortMcpConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            region: Region::default(),
            api_base_url: None,
            log_level: default_log_level(),
            log_path: None,
            dynamic_actions: default_enabled(),
            mcp_client: default_mcp_client(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl PortMcpConfig {
    /// Parse TOML and resolve `${VAR}` references from the process environment.
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let mut config: PortMcpConfig = toml::from_str(content)
            .map_err(|e| PortMcpError::InvalidConfig(format!("failed to parse config: {e}")))?;
        config.resolve_env_refs_with(&env_lookup);
        Ok(config)
    }

    /// Read a config file, then layer `PORT_*` environment variables on top.
    pub async fn load(path: &Path) -> crate::Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            PortMcpError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Config from `PORT_*` environment variables alone.
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `PORT_*` environment variables on top of the current values.
    pub fn apply_env_overrides(&mut self) -> crate::Result<()> {
        self.apply_overrides_with(&env_lookup)
    }

    fn resolve_env_refs_with(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        for value in [&mut self.client_id, &mut self.client_secret, &mut self.api_base_url]
            .into_iter()
            .flatten()
        {
            *value = resolve_value(value, lookup);
        }
        self.log_level = resolve_value(&self.log_level, lookup);
        self.mcp_client = resolve_value(&self.mcp_client, lookup);
    }

    fn apply_overrides_with(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> crate::Result<()> {
        if let Some(v) = lookup("PORT_CLIENT_ID") {
            self.client_id = Some(v);
        }
        if let Some(v) = lookup("PORT_CLIENT_SECRET") {
            self.client_secret = Some(v);
        }
        if let Some(v) = lookup("PORT_REGION") {
            self.region = v.parse()?;
        }
        if let Some(v) = lookup("PORT_API_BASE_URL") {
            self.api_base_url = Some(v);
        }
        if let Some(v) = lookup("PORT_LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = lookup("PORT_LOG_PATH") {
            self.log_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("PORT_DYNAMIC_ACTIONS") {
            self.dynamic_actions = parse_flag(&v).ok_or_else(|| {
                PortMcpError::InvalidConfig(format!(
                    "PORT_DYNAMIC_ACTIONS must be a boolean, got '{v}'"
                ))
            })?;
        }
        if let Some(v) = lookup("PORT_MCP_CLIENT") {
            self.mcp_client = v;
        }
        Ok(())
    }

    /// Validate the config, failing fast before any client is built.
    pub fn validate(&self) -> crate::Result<()> {
        let missing = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());
        if missing(&self.client_id) {
            return Err(PortMcpError::InvalidConfig(
                "client_id is required (set it in the config file or PORT_CLIENT_ID)".to_string(),
            ));
        }
        if missing(&self.client_secret) {
            return Err(PortMcpError::InvalidConfig(
                "client_secret is required (set it in the config file or PORT_CLIENT_SECRET)"
                    .to_string(),
            ));
        }

        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(PortMcpError::InvalidConfig(format!(
                "log_level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.log_level
            )));
        }

        if self.request_timeout_secs == 0 {
            return Err(PortMcpError::InvalidConfig(
                "request_timeout_secs must be > 0".to_string(),
            ));
        }

        if let Some(url) = &self.api_base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(PortMcpError::InvalidConfig(format!(
                    "api_base_url must be an http(s) URL, got '{url}'"
                )));
            }
        }

        Ok(())
    }

    /// API base URL without a trailing slash.
    pub fn api_base(&self) -> String {
        self.api_base_url
            .as_deref()
            .unwrap_or(self.region.api_base())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn ui_base(&self) -> &'static str {
        self.region.ui_base()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn user_agent(&self) -> String {
        format!("port-mcp-server/{}/{}", self.mcp_client, env!("CARGO_PKG_VERSION"))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
