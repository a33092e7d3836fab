//! Authenticated request wrapper for the bot API.

use {
    reqwest::{Client, Method, header},
    serde::{Serialize, de::DeserializeOwned},
    tracing::{debug, warn},
};

use crate::{
    Error, Result,
    config::QqBotAccountConfig,
    types::{ApiErrorBody, GatewayResponse},
};

/// Scheme prefix of the `Authorization` header.
pub const AUTH_SCHEME: &str = "QQBot";

/// HTTP access to one bot API deployment.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    api_base: String,
    token_url: String,
}

impl ApiClient {
    pub fn new(http: Client, api_base: impl Into<String>, token_url: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token_url: token_url.into(),
        }
    }

    pub fn from_config(http: Client, config: &QqBotAccountConfig) -> Self {
        Self::new(http, config.api_base(), config.token_url())
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Issue one authenticated call and decode the body as `T`.
    ///
    /// The body is parsed as JSON before the status is inspected, so a
    /// non-JSON error page surfaces as [`Error::ResponseParse`].
    pub async fn request<T, B>(
        &self,
        token: &str,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{path}", self.api_base);
        debug!(%method, path, "bot api request");

        let mut req = self
            .http
            .request(method, &url)
            .header(header::AUTHORIZATION, format!("{AUTH_SCHEME} {token}"))
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|e| Error::network(path, e))?;
        let status = resp.status();
        let raw = resp.text().await.map_err(|e| Error::network(path, e))?;

        let value = parse_json_body(&raw).map_err(|e| Error::response_parse(path, e))?;

        if !status.is_success() {
            let err = api_error(path, status.as_u16(), &value, &raw);
            warn!(path, status = status.as_u16(), error = %err, "bot api request failed");
            return Err(err);
        }

        serde_json::from_value(value).map_err(|e| Error::response_parse(path, e))
    }

    /// Resolve the WebSocket gateway URL.
    pub async fn gateway_url(&self, token: &str) -> Result<String> {
        let resp: GatewayResponse = self
            .request(token, Method::GET, "/gateway", None::<&()>)
            .await?;
        Ok(resp.url)
    }
}

/// Empty bodies decode as `null` so endpoints that answer 204 still work.
fn parse_json_body(raw: &str) -> serde_json::Result<serde_json::Value> {
    if raw.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(raw)
}

fn api_error(path: &str, status: u16, value: &serde_json::Value, raw: &str) -> Error {
    let body: ApiErrorBody = serde_json::from_value(value.clone()).unwrap_or_default();
    Error::Api {
        path: path.to_string(),
        status,
        code: body.code,
        message: body.message.unwrap_or_else(|| raw.to_string()),
    }
}
