//! Response schemas for the bot API.
//!
//! The platform is loose about scalar encoding (`expires_in` arrives as
//! `"7200"`, timestamps as either ISO strings or epoch numbers), so the
//! deserializers here accept a string or a number wherever that happens.

use serde::{Deserialize, Deserializer, Serialize};

/// Default credential lifetime when the token endpoint does not declare one.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 7200;

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

/// `"7200"` or `7200` → `Some(7200)`; null/missing → `None`.
fn de_opt_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let value = Option::<StringOrNumber>::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(StringOrNumber::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("expected unsigned integer, got {n}"))),
        Some(StringOrNumber::String(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected numeric string, got {s:?}"))),
    }
}

fn de_string_lenient<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<StringOrNumber>::deserialize(deserializer)?;
    Ok(match value {
        None => String::new(),
        Some(StringOrNumber::String(s)) => s,
        Some(StringOrNumber::Number(n)) => n.to_string(),
    })
}

/// Body of the app access token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default, deserialize_with = "de_opt_u64")]
    pub expires_in: Option<u64>,
}

impl TokenResponse {
    pub fn ttl_secs(&self) -> u64 {
        self.expires_in.unwrap_or(DEFAULT_TOKEN_TTL_SECS)
    }
}

/// Body of `GET /gateway`.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayResponse {
    pub url: String,
}

/// Result of any message send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResult {
    #[serde(default, deserialize_with = "de_string_lenient")]
    pub id: String,
    #[serde(default, deserialize_with = "de_string_lenient")]
    pub timestamp: String,
}

/// Body of `POST /v2/assets`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub file_info: String,
}

/// Error body the bot API returns with non-success statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
}
