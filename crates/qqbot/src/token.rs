//! Access token cache with expiry-aware refresh.

use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use {
    serde::Serialize,
    tokio::sync::RwLock,
    tracing::{debug, info},
};

use crate::{Error, Result, api::ApiClient, types::TokenResponse};

/// Refresh this long before the credential's declared expiry.
pub const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(5 * 60);

/// Source of wall-clock time in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// [`Clock`] backed by [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// A bearer token and the epoch millisecond it stops being valid.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub expires_at_ms: u64,
}

impl Credential {
    /// Usable at `now_ms` without entering the refresh margin.
    pub fn is_fresh(&self, now_ms: u64) -> bool {
        let margin = TOKEN_REFRESH_MARGIN.as_millis() as u64;
        now_ms < self.expires_at_ms.saturating_sub(margin)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("expires_at_ms", &self.expires_at_ms)
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    app_id: &'a str,
    client_secret: &'a str,
}

/// Holds at most one live [`Credential`].
///
/// Concurrent refreshes are not de-duplicated: each caller that finds the
/// cache stale performs its own request and the last write wins.
pub struct TokenCache {
    clock: Arc<dyn Clock>,
    cached: RwLock<Option<Credential>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            cached: RwLock::new(None),
        }
    }

    /// Return a valid token, refreshing through `api` when absent or near expiry.
    pub async fn ensure_token(&self, api: &ApiClient, app_id: &str, secret: &str) -> Result<String> {
        {
            let cached = self.cached.read().await;
            if let Some(cred) = cached.as_ref()
                && cred.is_fresh(self.clock.now_ms())
            {
                return Ok(cred.token.clone());
            }
        }

        let cred = self.fetch(api, app_id, secret).await?;
        let token = cred.token.clone();
        *self.cached.write().await = Some(cred);
        Ok(token)
    }

    /// Drop the cached credential so the next call re-authenticates.
    pub async fn clear(&self) {
        let mut cached = self.cached.write().await;
        if cached.take().is_some() {
            debug!("cleared cached access token");
        }
    }

    pub async fn current(&self) -> Option<Credential> {
        self.cached.read().await.clone()
    }

    async fn fetch(&self, api: &ApiClient, app_id: &str, secret: &str) -> Result<Credential> {
        let url = api.token_url();
        debug!(app_id, url, "requesting app access token");

        let resp = api
            .http()
            .post(url)
            .json(&TokenRequest {
                app_id,
                client_secret: secret,
            })
            .send()
            .await
            .map_err(|e| Error::network(url, e))?;
        let raw = resp.text().await.map_err(|e| Error::network(url, e))?;

        let body: TokenResponse =
            serde_json::from_str(&raw).map_err(|e| Error::response_parse(url, e))?;
        let Some(token) = body.access_token.clone().filter(|t| !t.is_empty()) else {
            return Err(Error::Auth { body: raw });
        };

        let ttl_secs = body.ttl_secs();
        let expires_at_ms = self
            .clock
            .now_ms()
            .saturating_add(ttl_secs.saturating_mul(1000));
        info!(app_id, ttl_secs, "refreshed app access token");

        Ok(Credential {
            token,
            expires_at_ms,
        })
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new()
    }
}
