//! JSON-over-HTTP connection
//!
//! Every operation is a `POST <endpoint>/<ApiName>` with the parameter
//! mapping as the JSON body. The connection exposes exactly the operations it
//! was built with, under their [`xform_name`] names.

use super::{xform_name, Connection, Params};
use crate::description::operation_api_names;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;
use uuid::Uuid;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips non-printable characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// HTTP connection to one service endpoint
#[derive(Clone)]
pub struct HttpConnection {
    client: Client,
    endpoint: Url,
    token: Option<String>,
    /// connection method name -> API operation name
    methods: BTreeMap<String, String>,
}

impl HttpConnection {
    /// Create a connection to `endpoint` exposing no operations yet
    pub fn new(endpoint: &str) -> Result<Self> {
        let mut endpoint =
            Url::parse(endpoint).with_context(|| format!("Invalid endpoint URL: {}", endpoint))?;

        // Url::join replaces the last segment unless the base ends with '/'
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(concat!("rescoll/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            token: None,
            methods: BTreeMap::new(),
        })
    }

    /// Create a connection exposing every operation named in a service
    /// description
    pub fn for_description(endpoint: &str, service_data: &Value) -> Result<Self> {
        let conn = operation_api_names(service_data)
            .iter()
            .fold(Self::new(endpoint)?, |conn, api_name| {
                conn.with_operation(api_name)
            });
        tracing::debug!(
            "HttpConnection for {} exposes {} methods",
            conn.endpoint,
            conn.methods.len()
        );
        Ok(conn)
    }

    /// Expose `api_name` as a connection method
    pub fn with_operation(mut self, api_name: &str) -> Self {
        self.methods
            .insert(xform_name(api_name), api_name.to_string());
        self
    }

    /// Send `Authorization: Bearer <token>` with every call
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Exposed connection method names
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(|s| s.as_str())
    }

    /// Build the URL an API operation is posted to
    pub fn operation_url(&self, api_name: &str) -> Result<Url> {
        self.endpoint
            .join(&urlencoding::encode(api_name))
            .with_context(|| format!("Failed to build URL for {}", api_name))
    }

    /// Make a POST request with a JSON body
    async fn post(&self, url: Url, body: &Value) -> Result<Value> {
        let request_id = Uuid::new_v4();
        tracing::debug!("POST {} (request {})", url, request_id);

        let mut request = self
            .client
            .post(url)
            .header("x-request-id", request_id.to_string())
            .json(body);

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.context("Failed to send request")?;

        let status = response.status();
        let response_body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&response_body));
            return Err(anyhow::anyhow!("API request failed: {}", status));
        }

        // Operations without output acknowledge with an empty body
        if response_body.trim().is_empty() {
            return Ok(Value::Bool(true));
        }

        serde_json::from_str(&response_body).context("Failed to parse response JSON")
    }
}

#[async_trait]
impl Connection for HttpConnection {
    fn supports(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    async fn call(&self, method: &str, params: Params) -> Result<Value> {
        let Some(api_name) = self.methods.get(method) else {
            return Err(anyhow::anyhow!("Unknown method: {}", method));
        };

        let url = self.operation_url(api_name)?;
        self.post(url, &Value::Object(params)).await
    }
}

/// Format a connection error for display
/// Avoids echoing raw response details back to the user
pub fn format_api_error(error: &anyhow::Error) -> String {
    let error_str = error.to_string();

    if error_str.contains("403") {
        return "Permission denied. Check the credentials for this endpoint.".to_string();
    }
    if error_str.contains("401") {
        return "Authentication failed. Check the configured token.".to_string();
    }
    if error_str.contains("404") {
        return "Resource not found.".to_string();
    }
    if error_str.contains("429") {
        return "Rate limit exceeded. Please try again later.".to_string();
    }
    if error_str.contains("400") {
        return "Invalid request. Check your parameters.".to_string();
    }
    if error_str.contains("500") || error_str.contains("503") {
        return "Service temporarily unavailable. Please try again.".to_string();
    }
    if error_str.contains("409") {
        return "Resource conflict. The resource may already exist or be in use.".to_string();
    }

    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(80)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}
