use std::sync::Arc;

use {reqwest::Client, secrecy::ExposeSecret, tracing::debug};

use crate::{
    Error, Result,
    api::ApiClient,
    config::QqBotAccountConfig,
    media, messages,
    seq::SeqTracker,
    target::MessageTarget,
    token::{Clock, TokenCache},
    types::SendResult,
};

/// One bot account: its config plus the token and sequence state that
/// belong to it.
///
/// Nothing here retries. A caller that sees [`Error::is_unauthorized`]
/// should call [`QqBotClient::clear_token`] before trying again.
pub struct QqBotClient {
    config: QqBotAccountConfig,
    api: ApiClient,
    tokens: TokenCache,
    seqs: SeqTracker,
}

impl QqBotClient {
    pub fn new(config: QqBotAccountConfig) -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;
        Self::with_http(config, http)
    }

    pub fn with_http(config: QqBotAccountConfig, http: Client) -> Result<Self> {
        config.validate()?;
        let api = ApiClient::from_config(http, &config);
        Ok(Self {
            config,
            api,
            tokens: TokenCache::new(),
            seqs: SeqTracker::new(),
        })
    }

    /// Replace the token cache clock, for deterministic expiry.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.tokens = TokenCache::with_clock(clock);
        self
    }

    pub fn config(&self) -> &QqBotAccountConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn seqs(&self) -> &SeqTracker {
        &self.seqs
    }

    /// A valid access token, refreshed if missing or close to expiry.
    pub async fn access_token(&self) -> Result<String> {
        self.tokens
            .ensure_token(
                &self.api,
                &self.config.app_id,
                self.config.client_secret.expose_secret(),
            )
            .await
    }

    /// Forget the cached token, e.g. after a 401.
    pub async fn clear_token(&self) {
        self.tokens.clear().await;
    }

    pub async fn gateway_url(&self) -> Result<String> {
        let token = self.access_token().await?;
        self.api.gateway_url(&token).await
    }

    /// Send text. Without `reply_to` the message is proactive.
    pub async fn send_text(
        &self,
        target: &MessageTarget,
        text: &str,
        reply_to: Option<&str>,
    ) -> Result<SendResult> {
        let token = self.access_token().await?;
        debug!(app_id = %self.config.app_id, %target, "send text");
        match target {
            MessageTarget::C2c(openid) => {
                messages::send_c2c_text(&self.api, &self.seqs, &token, openid, text, reply_to).await
            },
            MessageTarget::Group(group) => {
                messages::send_group_text(&self.api, &self.seqs, &token, group, text, reply_to)
                    .await
            },
            MessageTarget::Channel(channel) => {
                messages::send_channel_text(&self.api, &token, channel, text, reply_to).await
            },
        }
    }

    /// Upload `image_data` (URL, data URI or base64) and send it.
    pub async fn send_image(
        &self,
        target: &MessageTarget,
        image_data: &str,
        caption: Option<&str>,
        reply_to: Option<&str>,
    ) -> Result<SendResult> {
        let token = self.access_token().await?;
        let asset = media::upload_image(&self.api, &token, image_data).await?;
        debug!(app_id = %self.config.app_id, %target, "send image");
        match target {
            MessageTarget::C2c(openid) => {
                messages::send_c2c_image(
                    &self.api, &self.seqs, &token, openid, &asset, caption, reply_to,
                )
                .await
            },
            MessageTarget::Group(group) => {
                messages::send_group_image(
                    &self.api, &self.seqs, &token, group, &asset, caption, reply_to,
                )
                .await
            },
            MessageTarget::Channel(channel) => {
                messages::send_channel_image(&self.api, &token, channel, &asset, caption, reply_to)
                    .await
            },
        }
    }
}

impl std::fmt::Debug for QqBotClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QqBotClient")
            .field("config", &self.config)
            .field("tracked_seqs", &self.seqs.len())
            .finish_non_exhaustive()
    }
}
