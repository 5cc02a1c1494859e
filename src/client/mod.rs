//! PortClient: the reqwest implementation of the [`crate::api`] traits.
//!
//! Authenticates with OAuth client credentials, caches the access token until
//! shortly before it expires, and turns Port's `{ok, <field>}` envelopes into
//! typed results.

mod actions;
mod agent;
mod blueprints;
mod entities;
mod permissions;
mod scorecards;

use std::fmt;
use std::time::{Duration, Instant};

use reqwest::{Client, Method, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::api::PortApi;
use crate::config::PortMcpConfig;
use crate::error::PortMcpError;

/// Tokens are refreshed this long before Port says they expire.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Port's documented token lifetime, used when a response omits `expiresIn`.
const DEFAULT_TOKEN_TTL_SECS: u64 = 3 * 60 * 60;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_ttl")]
    expires_in: u64,
}

fn default_token_ttl() -> u64 {
    DEFAULT_TOKEN_TTL_SECS
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }
}

/// Relative API path held as raw segments.
///
/// Each segment is percent-encoded on its own when the URL is built, so an
/// identifier containing `/`, `?` or `#` stays inside its segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ApiPath(Vec<String>);

impl ApiPath {
    pub(crate) fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for ApiPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// Authenticated Port REST client.
pub struct PortClient {
    http: Client,
    api_base: Url,
    ui_base: String,
    client_id: String,
    client_secret: String,
    /// Held across a refresh so concurrent requests share one token fetch.
    token: Mutex<Option<AccessToken>>,
}

impl PortClient {
    pub fn new(
        api_base: &str,
        ui_base: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> crate::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        let api_base = Url::parse(api_base.trim_end_matches('/')).map_err(|e| {
            PortMcpError::InvalidConfig(format!("invalid API base '{api_base}': {e}"))
        })?;
        if api_base.cannot_be_a_base() {
            return Err(PortMcpError::InvalidConfig(format!(
                "API base '{api_base}' cannot hold a path"
            )));
        }
        Ok(Self {
            http,
            api_base,
            ui_base: ui_base.trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token: Mutex::new(None),
        })
    }

    /// Build a client from validated config.
    pub fn from_config(config: &PortMcpConfig) -> crate::Result<Self> {
        config.validate()?;
        Self::new(
            &config.api_base(),
            config.ui_base(),
            config.client_id.clone().unwrap_or_default(),
            config.client_secret.clone().unwrap_or_default(),
            &config.user_agent(),
            config.request_timeout(),
        )
    }

    pub fn api_base(&self) -> &str {
        self.api_base.as_str()
    }

    /// Absolute URL for `path`. Empty, `.` and `..` segments are rejected
    /// since they would address a different resource.
    fn url(&self, path: &ApiPath) -> crate::Result<Url> {
        if let Some(bad) = path.0.iter().find(|s| matches!(s.as_str(), "" | "." | "..")) {
            return Err(PortMcpError::InvalidArguments(format!(
                "'{bad}' is not a valid identifier (in {path})"
            )));
        }
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| {
                PortMcpError::InvalidConfig(format!("API base '{}' cannot hold a path", self.api_base))
            })?
            .pop_if_empty()
            .extend(&path.0);
        Ok(url)
    }

    /// Current access token, fetching a new one when missing or about to expire.
    async fn access_token(&self) -> crate::Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_fresh() {
                return Ok(token.value.clone());
            }
        }
        let token = self.fetch_token().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn fetch_token(&self) -> crate::Result<AccessToken> {
        tracing::debug!("requesting Port access token");
        let response = self
            .http
            .post(self.url(&ApiPath::new(["auth", "access_token"]))?)
            .json(&json!({
                "clientId": self.client_id,
                "clientSecret": self.client_secret,
            }))
            .send()
            .await
            .map_err(|e| PortMcpError::Auth(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PortMcpError::Auth(format!(
                "token request returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PortMcpError::Auth(format!("malformed token response: {e}")))?;
        tracing::info!(expires_in = token.expires_in, "obtained Port access token");
        Ok(AccessToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }

    async fn send(
        &self,
        method: Method,
        path: &ApiPath,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> crate::Result<Value> {
        let url = self.url(path)?;
        let token = self.access_token().await?;
        tracing::debug!(method = %method, %path, "Port API request");

        let mut request = self
            .http
            .request(method.clone(), url)
            .bearer_auth(token);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }
        let response = request.send().await?;
        read_envelope(&method, &path.to_string(), response).await
    }

    pub(crate) async fn get(&self, path: &ApiPath) -> crate::Result<Value> {
        self.send(Method::GET, path, &[], None).await
    }

    pub(crate) async fn get_with(&self, path: &ApiPath, query: &[(&str, String)]) -> crate::Result<Value> {
        self.send(Method::GET, path, query, None).await
    }

    pub(crate) async fn post(&self, path: &ApiPath, body: Value) -> crate::Result<Value> {
        self.send(Method::POST, path, &[], Some(body)).await
    }

    pub(crate) async fn post_with(
        &self,
        path: &ApiPath,
        query: &[(&str, String)],
        body: Value,
    ) -> crate::Result<Value> {
        self.send(Method::POST, path, query, Some(body)).await
    }

    pub(crate) async fn put(&self, path: &ApiPath, body: Value) -> crate::Result<Value> {
        self.send(Method::PUT, path, &[], Some(body)).await
    }

    pub(crate) async fn patch(&self, path: &ApiPath, body: Value) -> crate::Result<Value> {
        self.send(Method::PATCH, path, &[], Some(body)).await
    }

    pub(crate) async fn delete(&self, path: &ApiPath, query: &[(&str, String)]) -> crate::Result<Value> {
        self.send(Method::DELETE, path, query, None).await
    }
}

impl PortApi for PortClient {
    fn ui_base_url(&self) -> &str {
        &self.ui_base
    }
}

/// Read a response body, mapping non-2xx statuses and `ok: false` to [`PortMcpError::Api`].
async fn read_envelope(method: &Method, path: &str, response: Response) -> crate::Result<Value> {
    let status = response.status();
    let text = response.text().await?;
    let body: Value = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text.clone()))
    };

    let rejected = !status.is_success() || body.get("ok") == Some(&Value::Bool(false));
    if rejected {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(text);
        tracing::debug!(status = status.as_u16(), method = %method, path, %message, "Port API error");
        return Err(PortMcpError::Api {
            status: status.as_u16(),
            method: method.to_string(),
            path: path.to_string(),
            message,
        });
    }
    Ok(body)
}

/// Take `field` out of a response envelope.
pub(crate) fn extract<T: DeserializeOwned>(
    body: Value,
    field: &str,
    path: impl fmt::Display,
) -> crate::Result<T> {
    let Value::Object(mut map) = body else {
        return Err(PortMcpError::UnexpectedResponse(
            path.to_string(),
            "expected a JSON object".to_string(),
        ));
    };
    let value = map.remove(field).ok_or_else(|| {
        PortMcpError::UnexpectedResponse(path.to_string(), format!("missing '{field}'"))
    })?;
    serde_json::from_value(value)
        .map_err(|e| PortMcpError::UnexpectedResponse(path.to_string(), e.to_string()))
}

/// Like [`extract`], but accepts an unwrapped body when `field` is absent.
pub(crate) fn extract_or_body<T: DeserializeOwned>(
    body: Value,
    field: &str,
    path: impl fmt::Display,
) -> crate::Result<T> {
    let value = match body {
        Value::Object(mut map) => match map.remove(field) {
            Some(inner) => inner,
            None => Value::Object(map),
        },
        other => other,
    };
    serde_json::from_value(value)
        .map_err(|e| PortMcpError::UnexpectedResponse(path.to_string(), e.to_string()))
}

pub(crate) fn flag(value: bool) -> String {
    value.to_string()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Client pointed at `server`'s `/v1`, with the token endpoint mounted.
    pub(crate) async fn authed_client(server: &MockServer) -> PortClient {
        Mock::given(method("POST"))
            .and(path("/v1/auth/access_token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"accessToken": "test-token", "expiresIn": 3600})),
            )
            .mount(server)
            .await;
        PortClient::new(
            &format!("{}/v1", server.uri()),
            "https://app.getport.io",
            "id",
            "secret",
            "port-mcp-server/test/0.0.0",
            Duration::from_secs(5),
        )
        .unwrap()
    }
}
