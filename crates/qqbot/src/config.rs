use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

use crate::{Error, Result};

/// Production bot API base.
pub const DEFAULT_API_BASE: &str = "https://api.sgroup.qq.com";

/// Sandbox bot API base, used when `sandbox` is enabled.
pub const SANDBOX_API_BASE: &str = "https://sandbox.api.sgroup.qq.com";

/// App access token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://bots.qq.com/app/getAppAccessToken";

/// Configuration for a single QQ bot account.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QqBotAccountConfig {
    /// Bot application id from the developer console.
    pub app_id: String,

    /// Bot application secret.
    #[serde(serialize_with = "serialize_secret")]
    pub client_secret: Secret<String>,

    /// Talk to the sandbox environment instead of production.
    pub sandbox: bool,

    /// Override for the API base URL. Takes precedence over `sandbox`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    /// Override for the access token endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
}

impl QqBotAccountConfig {
    pub fn new(app_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            client_secret: Secret::new(client_secret.into()),
            ..Default::default()
        }
    }

    /// Resolved API base without a trailing slash.
    pub fn api_base(&self) -> String {
        let base = match &self.api_base {
            Some(base) => base.as_str(),
            None if self.sandbox => SANDBOX_API_BASE,
            None => DEFAULT_API_BASE,
        };
        base.trim_end_matches('/').to_string()
    }

    pub fn token_url(&self) -> String {
        self.token_url
            .clone()
            .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string())
    }

    /// Reject configs that can never authenticate.
    pub fn validate(&self) -> Result<()> {
        if self.app_id.trim().is_empty() {
            return Err(Error::config("app_id is required"));
        }
        if self.client_secret.expose_secret().trim().is_empty() {
            return Err(Error::config("client_secret is required"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for QqBotAccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QqBotAccountConfig")
            .field("app_id", &self.app_id)
            .field("client_secret", &"[REDACTED]")
            .field("sandbox", &self.sandbox)
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl Default for QqBotAccountConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            client_secret: Secret::new(String::new()),
            sandbox: false,
            api_base: None,
            token_url: None,
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}
