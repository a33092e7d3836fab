use async_trait::async_trait;

use crate::Result;

/// Image to deliver, in any form the platform client accepts
/// (remote URL, `data:` URI, or bare base64).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OutboundMedia {
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Send messages to a channel.
///
/// `to` is a platform-specific destination string; `reply_to` is the id of
/// the inbound message being answered, `None` for unsolicited messages.
#[async_trait]
pub trait ChannelOutbound: Send + Sync {
    async fn send_text(
        &self,
        account_id: &str,
        to: &str,
        text: &str,
        reply_to: Option<&str>,
    ) -> Result<()>;

    async fn send_media(
        &self,
        account_id: &str,
        to: &str,
        media: &OutboundMedia,
        reply_to: Option<&str>,
    ) -> Result<()>;
}

/// Probe channel account health.
#[async_trait]
pub trait ChannelStatus: Send + Sync {
    async fn probe(&self, account_id: &str) -> Result<ChannelHealthSnapshot>;
}

/// Channel health snapshot.
#[derive(Debug, Clone)]
pub struct ChannelHealthSnapshot {
    pub connected: bool,
    pub account_id: String,
    pub details: Option<String>,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_caption_is_optional() {
        let media: OutboundMedia = serde_json::from_str(r#"{"image":"https://x/y.png"}"#).unwrap();
        assert_eq!(media.image, "https://x/y.png");
        assert!(media.caption.is_none());
        assert_eq!(
            serde_json::to_string(&media).unwrap(),
            r#"{"image":"https://x/y.png"}"#
        );
    }
}
