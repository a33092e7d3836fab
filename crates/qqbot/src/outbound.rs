//! [`ChannelOutbound`] implementation over registered bot accounts.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use {
    async_trait::async_trait,
    qqbot_channels::{
        ChannelHealthSnapshot, ChannelOutbound, ChannelStatus, Error as ChannelError,
        OutboundMedia, Result as ChannelResult,
    },
    tracing::{info, warn},
};

use crate::{
    Error, Result, client::QqBotClient, config::QqBotAccountConfig, target::MessageTarget,
};

/// Shared account map.
pub type AccountMap = Arc<RwLock<HashMap<String, Arc<QqBotClient>>>>;

/// Routes `(account_id, to)` pairs to the right bot account and surface.
#[derive(Clone, Default)]
pub struct QqBotOutbound {
    accounts: AccountMap,
}

impl QqBotOutbound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: AccountMap) -> Self {
        Self { accounts }
    }

    /// Register (or replace) an account. A replaced account starts with a
    /// fresh token cache and fresh sequence counters.
    pub fn add_account(&self, account_id: &str, config: QqBotAccountConfig) -> Result<()> {
        let client = QqBotClient::new(config)?;
        self.insert_client(account_id, client);
        Ok(())
    }

    pub fn insert_client(&self, account_id: &str, client: QqBotClient) {
        let mut accounts = self.accounts.write().unwrap_or_else(|e| e.into_inner());
        if accounts
            .insert(account_id.to_string(), Arc::new(client))
            .is_some()
        {
            info!(account_id, "replaced qqbot account");
        } else {
            info!(account_id, "registered qqbot account");
        }
    }

    pub fn remove_account(&self, account_id: &str) -> bool {
        let mut accounts = self.accounts.write().unwrap_or_else(|e| e.into_inner());
        accounts.remove(account_id).is_some()
    }

    pub fn account_ids(&self) -> Vec<String> {
        let accounts = self.accounts.read().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<String> = accounts.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn client(&self, account_id: &str) -> ChannelResult<Arc<QqBotClient>> {
        let accounts = self.accounts.read().unwrap_or_else(|e| e.into_inner());
        accounts
            .get(account_id)
            .cloned()
            .ok_or_else(|| ChannelError::unknown_account(account_id))
    }
}

fn parse_target(to: &str) -> ChannelResult<MessageTarget> {
    to.parse::<MessageTarget>()
        .map_err(ChannelError::invalid_input)
}

fn to_channel_error(context: &str, account_id: &str, to: &str, err: Error) -> ChannelError {
    warn!(account_id, to, error = %err, "qqbot {context} failed");
    match err {
        Error::InvalidTarget { .. } => ChannelError::invalid_input(err),
        other => ChannelError::external(context.to_string(), other),
    }
}

#[async_trait]
impl ChannelOutbound for QqBotOutbound {
    async fn send_text(
        &self,
        account_id: &str,
        to: &str,
        text: &str,
        reply_to: Option<&str>,
    ) -> ChannelResult<()> {
        let client = self.client(account_id)?;
        let target = parse_target(to)?;
        client
            .send_text(&target, text, reply_to)
            .await
            .map(|_| ())
            .map_err(|e| to_channel_error("send text", account_id, to, e))
    }

    async fn send_media(
        &self,
        account_id: &str,
        to: &str,
        media: &OutboundMedia,
        reply_to: Option<&str>,
    ) -> ChannelResult<()> {
        let client = self.client(account_id)?;
        let target = parse_target(to)?;
        client
            .send_image(&target, &media.image, media.caption.as_deref(), reply_to)
            .await
            .map(|_| ())
            .map_err(|e| to_channel_error("send image", account_id, to, e))
    }
}

#[async_trait]
impl ChannelStatus for QqBotOutbound {
    /// Healthy when a token can be obtained and the gateway URL resolves.
    async fn probe(&self, account_id: &str) -> ChannelResult<ChannelHealthSnapshot> {
        let client = self.client(account_id)?;
        let snapshot = match client.gateway_url().await {
            Ok(url) => ChannelHealthSnapshot {
                connected: true,
                account_id: account_id.to_string(),
                details: Some(format!("gateway {url}")),
            },
            Err(e) => ChannelHealthSnapshot {
                connected: false,
                account_id: account_id.to_string(),
                details: Some(e.to_string()),
            },
        };
        Ok(snapshot)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        mockito::{Matcher, Server},
        serde_json::json,
    };

    fn outbound_for(server: &Server) -> QqBotOutbound {
        let outbound = QqBotOutbound::new();
        outbound
            .add_account("bot-a", QqBotAccountConfig {
                api_base: Some(server.url()),
                token_url: Some(format!("{}/app/getAppAccessToken", server.url())),
                ..QqBotAccountConfig::new("app", "secret")
            })
            .unwrap();
        outbound
    }

    async fn token_mock(server: &mut Server) -> mockito::Mock {
        server
            .mock("POST", "/app/getAppAccessToken")
            .with_status(200)
            .with_body(r#"{"access_token":"T1","expires_in":"7200"}"#)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn unknown_account_returns_error() {
        let outbound = QqBotOutbound::new();
        let err = outbound
            .send_text("nonexistent", "c2c:u1", "hi", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::UnknownAccount { .. }));
        assert!(err.to_string().contains("unknown channel account"));
    }

    #[tokio::test]
    async fn invalid_target_is_rejected_before_network() {
        let server = Server::new_async().await;
        let outbound = outbound_for(&server);
        let err = outbound
            .send_text("bot-a", "dm:u1", "hi", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn routes_group_target() {
        let mut server = Server::new_async().await;
        let _token = token_mock(&mut server).await;
        let send = server
            .mock("POST", "/v2/groups/g1/messages")
            .match_body(Matcher::Json(
                json!({"content": "hi", "msg_type": 0, "msg_seq": 1, "msg_id": "in-1"}),
            ))
            .with_status(200)
            .with_body(r#"{"id":"1","timestamp":"t"}"#)
            .create_async()
            .await;

        let outbound = outbound_for(&server);
        outbound
            .send_text("bot-a", "group:g1", "hi", Some("in-1"))
            .await
            .unwrap();
        send.assert_async().await;
    }

    #[tokio::test]
    async fn routes_channel_media() {
        let mut server = Server::new_async().await;
        let _token = token_mock(&mut server).await;
        let _upload = server
            .mock("POST", "/v2/assets")
            .with_status(200)
            .with_body(r#"{"file_info":"asset-1"}"#)
            .create_async()
            .await;
        let send = server
            .mock("POST", "/channels/c1/messages")
            .match_body(Matcher::PartialJson(json!({
                "segments": [{"type": "image", "file_info": "asset-1"}]
            })))
            .with_status(200)
            .with_body(r#"{"id":"2","timestamp":"t"}"#)
            .create_async()
            .await;

        let outbound = outbound_for(&server);
        let media = OutboundMedia {
            image: "https://x/y.png".into(),
            caption: None,
        };
        outbound
            .send_media("bot-a", "channel:c1", &media, None)
            .await
            .unwrap();
        send.assert_async().await;
    }

    #[tokio::test]
    async fn api_error_is_wrapped_with_source() {
        let mut server = Server::new_async().await;
        let _token = token_mock(&mut server).await;
        let _send = server
            .mock("POST", "/v2/users/u1/messages")
            .with_status(400)
            .with_body(r#"{"message":"bad request","code":40034}"#)
            .create_async()
            .await;

        let outbound = outbound_for(&server);
        let err = outbound
            .send_text("bot-a", "u1", "hi", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("bad request"));
        let source = err.source_as::<Error>().unwrap();
        assert!(matches!(source, Error::Api { status: 400, .. }));
    }

    #[tokio::test]
    async fn probe_reports_gateway() {
        let mut server = Server::new_async().await;
        let _token = token_mock(&mut server).await;
        let _gateway = server
            .mock("GET", "/gateway")
            .with_status(200)
            .with_body(r#"{"url":"wss://example/websocket"}"#)
            .create_async()
            .await;

        let outbound = outbound_for(&server);
        let snapshot = outbound.probe("bot-a").await.unwrap();
        assert!(snapshot.connected);
        assert_eq!(snapshot.account_id, "bot-a");
        assert_eq!(snapshot.details.as_deref(), Some("gateway wss://example/websocket"));
    }

    #[tokio::test]
    async fn probe_reports_auth_failure_as_disconnected() {
        let mut server = Server::new_async().await;
        let _token = server
            .mock("POST", "/app/getAppAccessToken")
            .with_status(200)
            .with_body(r#"{"code":100016,"message":"invalid appid"}"#)
            .create_async()
            .await;

        let outbound = outbound_for(&server);
        let snapshot = outbound.probe("bot-a").await.unwrap();
        assert!(!snapshot.connected);
        assert!(snapshot.details.unwrap().contains("invalid appid"));
    }

    #[test]
    fn account_registry() {
        let outbound = QqBotOutbound::new();
        outbound
            .add_account("b", QqBotAccountConfig::new("app-b", "s"))
            .unwrap();
        outbound
            .add_account("a", QqBotAccountConfig::new("app-a", "s"))
            .unwrap();
        assert_eq!(outbound.account_ids(), vec!["a", "b"]);
        assert!(outbound.remove_account("a"));
        assert!(!outbound.remove_account("a"));
        assert!(outbound.client("a").is_err());
        assert_eq!(outbound.client("b").unwrap().config().app_id, "app-b");
    }

    #[test]
    fn add_account_validates_config() {
        let outbound = QqBotOutbound::new();
        assert!(outbound
            .add_account("bad", QqBotAccountConfig::default())
            .is_err());
        assert!(outbound.account_ids().is_empty());
    }
}
